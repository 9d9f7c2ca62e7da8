//! Streaming relay
//!
//! Forwards the bytes of a resolved stream URL without buffering the whole
//! body. The returned stream is pull-based: the upstream is read only when
//! the consumer asks for the next chunk, and dropping the stream drops the
//! upstream response. Upstream trouble ends the stream early instead of
//! yielding an error item.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::USER_AGENT;

use crate::config::RelayConfig;
use crate::resolver::errors::{BackendError, ResolveError};
use crate::resolver::traits::{choose, RandomSource};

/// Size of every relayed chunk except possibly the last
pub const CHUNK_SIZE: usize = 8 * 1024;

pub struct StreamRelay {
    client: reqwest::Client,
    user_agents: Vec<String>,
    read_timeout: Duration,
    random: Arc<dyn RandomSource>,
}

impl StreamRelay {
    pub fn new(config: &RelayConfig, random: Arc<dyn RandomSource>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            user_agents: config.user_agents.clone(),
            read_timeout: config.read_timeout,
            random,
        })
    }

    /// Lazy byte stream of `url`. Nothing is sent until the first poll.
    pub fn relay(&self, url: &str) -> BoxStream<'static, Bytes> {
        let client = self.client.clone();
        let url = url.to_string();
        let user_agent = choose(self.random.as_ref(), &self.user_agents).cloned();
        let read_timeout = self.read_timeout;

        stream::once(open_upstream(client, url, user_agent, read_timeout))
            .flat_map(move |response| match response {
                Some(response) => rechunk(response.bytes_stream().boxed(), CHUNK_SIZE, read_timeout),
                None => stream::empty().boxed(),
            })
            .boxed()
    }
}

async fn open_upstream(
    client: reqwest::Client,
    url: String,
    user_agent: Option<String>,
    read_timeout: Duration,
) -> Option<reqwest::Response> {
    let mut request = client.get(&url);
    if let Some(user_agent) = user_agent {
        request = request.header(USER_AGENT, user_agent);
    }

    let response = match tokio::time::timeout(read_timeout, request.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::warn!(%url, error = %e, "relay upstream connection failed");
            return None;
        }
        Err(_) => {
            tracing::warn!(%url, "relay upstream did not answer in time");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::warn!(%url, status = %response.status(), "relay upstream refused");
        return None;
    }

    tracing::debug!(%url, "relay upstream opened");
    Some(response)
}

struct Rechunk<E> {
    upstream: BoxStream<'static, Result<Bytes, E>>,
    buffer: BytesMut,
    finished: bool,
}

/// Re-cut an upstream byte stream into `chunk_size` pieces.
///
/// Each upstream read must complete within `read_timeout`. A read error or
/// timeout ends the output after flushing what was already received.
pub fn rechunk<E>(
    upstream: BoxStream<'static, Result<Bytes, E>>,
    chunk_size: usize,
    read_timeout: Duration,
) -> BoxStream<'static, Bytes>
where
    E: fmt::Display + Send + 'static,
{
    let state = Rechunk {
        upstream,
        buffer: BytesMut::with_capacity(chunk_size),
        finished: false,
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            if state.buffer.len() >= chunk_size {
                let chunk = state.buffer.split_to(chunk_size).freeze();
                return Some((chunk, state));
            }
            if state.finished {
                if state.buffer.is_empty() {
                    return None;
                }
                let rest = state.buffer.split().freeze();
                return Some((rest, state));
            }

            match tokio::time::timeout(read_timeout, state.upstream.next()).await {
                Ok(Some(Ok(bytes))) => state.buffer.extend_from_slice(&bytes),
                Ok(Some(Err(e))) => {
                    let err = ResolveError::UpstreamStream(e.to_string());
                    tracing::warn!(error = %err, "relay truncated");
                    state.finished = true;
                }
                Ok(None) => state.finished = true,
                Err(_) => {
                    let err = ResolveError::UpstreamStream(format!(
                        "no data for {}s",
                        read_timeout.as_secs()
                    ));
                    tracing::warn!(error = %err, "relay truncated");
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
