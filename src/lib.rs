pub mod config;
pub mod logging;
pub mod relay;
pub mod resolver;
pub mod server;

use config::AppConfig;

/// Run the HTTP service with a fully built configuration
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    server::run_server(config).await
}
