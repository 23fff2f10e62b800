//! Boot — logging init and config load.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::GcLogConfig;

/// Initialise the tracing / logging subsystem. Logs go to stderr so the
/// JSON report on stdout stays clean.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gclog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate configuration.
pub fn boot() -> Result<GcLogConfig, Box<dyn std::error::Error>> {
    info!("Starting gclog v{}", env!("CARGO_PKG_VERSION"));

    let config = GcLogConfig::load()?;
    config.validate()?;
    info!(
        "Loaded configuration: mode={}, workers={}, jvm_start_date={}",
        config.mode.as_str(),
        config.workers,
        config.jvm_start_date.as_deref().unwrap_or("none")
    );
    Ok(config)
}
