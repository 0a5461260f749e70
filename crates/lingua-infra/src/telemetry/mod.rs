//! Tracing initialization
//!
//! One registry with an `EnvFilter` (`RUST_LOG`, default `lingua=debug`) and a fmt layer
//! in the configured format.

use lingua_core::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "lingua=debug,sqlx=warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?,
    }

    tracing::debug!(?format, "Tracing initialized");
    Ok(())
}
