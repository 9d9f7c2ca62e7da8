// HTTP handlers

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use super::errors::ApiError;
use super::AppState;
use crate::config::MAX_SEARCH_LIMIT;
use crate::resolver::{locator, ContentIdentifier, ResolveError, ResolvedStream, SearchResult};

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RelatedResponse {
    id: ContentIdentifier,
    title: String,
}

fn parse_limit(raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match raw.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<usize>()
            .map(|limit| limit.clamp(1, MAX_SEARCH_LIMIT))
            .map_err(|_| ApiError::bad_request(format!("Invalid limit '{}'", raw))),
    }
}

fn required_identifier(params: &UrlParams) -> Result<ContentIdentifier, ApiError> {
    let raw = params
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing video URL"))?;

    locator::parse(raw)
        .ok_or_else(|| ResolveError::InvalidInput(format!("Unrecognized video URL '{}'", raw)).into())
}

/// Accept either an already-decoded URL or a percent-encoded one
fn proxy_target(raw: &str) -> Option<Url> {
    let decoded = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        urlencoding::decode(raw).ok()?.into_owned()
    };

    let url = Url::parse(&decoded).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing query"))?;
    let limit = parse_limit(params.limit.as_deref(), state.search_limit)?;

    let results = state.engine.search(query, limit).await?;
    Ok(Json(results))
}

pub async fn stream_url(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> Result<Json<ResolvedStream>, ApiError> {
    let id = required_identifier(&params)?;
    let stream = state.engine.resolve_stream(&id).await?;
    Ok(Json(stream))
}

pub async fn related(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> Result<Json<RelatedResponse>, ApiError> {
    let id = required_identifier(&params)?;
    let item = state.engine.resolve_related(&id).await;
    Ok(Json(RelatedResponse {
        id: item.identifier,
        title: item.title,
    }))
}

pub async fn proxy(State(state): State<AppState>, Query(params): Query<UrlParams>) -> Response {
    let Some(raw) = params.url.as_deref().filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing URL").into_response();
    };
    let Some(target) = proxy_target(raw) else {
        return (StatusCode::BAD_REQUEST, "Invalid URL").into_response();
    };

    tracing::info!(host = target.host_str().unwrap_or_default(), "relaying stream");
    let body = Body::from_stream(state.relay.relay(target.as_str()).map(Ok::<_, Infallible>));

    ([(header::CONTENT_TYPE, "video/mp4")], body).into_response()
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(parse_limit(None, 10).unwrap(), 10);
        assert_eq!(parse_limit(Some(""), 10).unwrap(), 10);
        assert_eq!(parse_limit(Some("5"), 10).unwrap(), 5);
        assert_eq!(parse_limit(Some("0"), 10).unwrap(), 1);
        assert_eq!(parse_limit(Some("500"), 10).unwrap(), MAX_SEARCH_LIMIT);
        assert!(parse_limit(Some("ten"), 10).is_err());
    }

    #[test]
    fn proxy_target_accepts_plain_and_encoded() {
        assert_eq!(
            proxy_target("https://cdn.example/v.mp4?sig=a%2Fb").unwrap().as_str(),
            "https://cdn.example/v.mp4?sig=a%2Fb"
        );
        assert_eq!(
            proxy_target("https%3A%2F%2Fcdn.example%2Fv.mp4").unwrap().as_str(),
            "https://cdn.example/v.mp4"
        );
    }

    #[test]
    fn proxy_target_rejects_other_schemes() {
        assert!(proxy_target("file:///etc/passwd").is_none());
        assert!(proxy_target("ftp%3A%2F%2Fhost%2Ffile").is_none());
        assert!(proxy_target("not a url").is_none());
    }
}
