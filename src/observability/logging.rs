//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable through `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, Environment};

/// Default filter directive for a configured level.
pub fn default_directive(level: &str) -> String {
    format!("farmerice={level},tower_http={level}")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.observability.log_level).into());

    let json = config.environment == Environment::Production;

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .try_init();

    if result.is_ok() {
        tracing::info!(
            environment = %config.environment,
            format = if json { "json" } else { "text" },
            "Logging initialized"
        );
    }
}
