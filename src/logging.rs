//! Tracing setup
//!
//! Console output only. `RUST_LOG` overrides the level given on the command line.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when `level` is not a valid filter directive or a global subscriber
/// is already installed.
pub fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(console_layer).try_init()?;

    tracing::debug!(level, "tracing initialized");
    Ok(())
}
