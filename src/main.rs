// stream-resolver binary

use anyhow::Context;
use clap::Parser;

use stream_resolver_lib::config::{AppConfig, CliArgs};
use stream_resolver_lib::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = AppConfig::from_args(args).context("invalid configuration")?;

    init_tracing(&config.log_level)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;

    stream_resolver_lib::run(config).await
}
