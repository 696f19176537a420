//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses and origins parse before the server starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than zero"));
    }

    if config.database.url.trim().is_empty() {
        errors.push(ValidationError::new("database.url", "must not be empty"));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be greater than zero",
        ));
    }

    for origin in &config.cors.allowed_origins {
        let well_formed = (origin.starts_with("http://") || origin.starts_with("https://"))
            && HeaderValue::from_str(origin).is_ok();
        if !well_formed {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("invalid origin '{origin}'"),
            ));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new(
                "rate_limit.max_requests",
                "must be greater than zero",
            ));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.window_secs",
                "must be greater than zero",
            ));
        }
    }

    if config.uploads.max_file_bytes == 0 {
        errors.push(ValidationError::new("uploads.max_file_bytes", "must be greater than zero"));
    }
    if let Some(ext) = config
        .uploads
        .allowed_extensions
        .iter()
        .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        errors.push(ValidationError::new(
            "uploads.allowed_extensions",
            format!("invalid extension '{ext}'"),
        ));
    }

    if config.shutdown.grace_secs == 0 {
        errors.push(ValidationError::new("shutdown.grace_secs", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
