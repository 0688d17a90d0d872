//! Logging setup for the runner.

use anyhow::Result;
use skirmish_core::LogFormat;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_telemetry(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,skirmish_world=info".into());

    // Status frames own stdout; logs go to stderr.
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    info!(?format, "Telemetry initialized");
    Ok(())
}
