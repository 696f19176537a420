//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the backend.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the FarmeRice backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment (`NODE_ENV`).
    pub environment: Environment,

    /// Listener and request handling settings.
    pub server: ServerConfig,

    /// Document store connection.
    pub database: DatabaseConfig,

    /// Cross-origin policy for the API.
    pub cors: CorsConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security hardening configuration.
    pub security: SecurityConfig,

    /// Static asset directories.
    pub static_files: StaticFilesConfig,

    /// Upload endpoint limits.
    pub uploads: UploadConfig,

    /// Shutdown behavior.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Resolve the static asset directories for the configured environment.
    pub fn static_paths(&self) -> StaticPaths {
        let files = &self.static_files;
        let frontend = match self.environment {
            Environment::Production => Some(
                files
                    .frontend_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("frontend/dist")),
            ),
            _ => None,
        };

        StaticPaths {
            uploads: files.uploads_dir.clone(),
            public: files.public_dir.clone(),
            frontend,
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Anything other than `production` or `test` counts as development.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Fixed listening port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum JSON/form body size in bytes.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: 30,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (`DATABASE_URL`).
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://farmerice.db?mode=rwc".to_string(),
            max_connections: 5,
            connect_timeout_secs: 10,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin without credentials.
    pub allowed_origins: Vec<String>,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on `/api`.
    pub enabled: bool,

    /// Requests allowed per client within one window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Use the first `X-Forwarded-For` entry as the client address.
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
            trust_proxy: false,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

/// Static asset directories.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Uploaded files, served under `/uploads`.
    pub uploads_dir: PathBuf,

    /// Public assets, served under `/public`.
    pub public_dir: PathBuf,

    /// Bundled frontend. Only served in production; defaults to `frontend/dist`.
    pub frontend_dir: Option<PathBuf>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            frontend_dir: None,
        }
    }
}

/// Static asset directories after environment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub uploads: PathBuf,
    pub public: PathBuf,
    pub frontend: Option<PathBuf>,
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum size of a single file in bytes.
    pub max_file_bytes: usize,

    /// Accepted file extensions (lower-case, without dot).
    pub allowed_extensions: Vec<String>,
}

impl UploadConfig {
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 5 * 1024 * 1024,
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp", "svg"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline for draining connections and closing the store.
    pub grace_secs: u64,
}

impl ShutdownConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 3 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
