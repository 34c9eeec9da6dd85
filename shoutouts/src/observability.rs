//! Structured logging setup

use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// Initialize the global tracing subscriber
///
/// `service.log_level` is an `EnvFilter` directive; an unparsable value falls
/// back to `info`. `service.log_format` selects `json` (default) or `pretty`.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.service.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.service.log_format.as_str() {
        "pretty" => builder.pretty().try_init(),
        _ => builder.json().try_init(),
    };
    installed.map_err(|e| {
        Error::Internal(format!("failed to install tracing subscriber: {}", e))
    })?;

    tracing::info!("Tracing initialized for service: {}", config.service.name);

    Ok(())
}
