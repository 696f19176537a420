//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (dotenvy) + farmerice.toml
//!     → loader.rs (parse, overlay environment variables)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; nothing re-reads the environment later
//! - All fields have defaults to allow minimal configs
//! - Dev vs production asset paths resolve into `StaticPaths`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::CorsConfig;
pub use schema::DatabaseConfig;
pub use schema::Environment;
pub use schema::ObservabilityConfig;
pub use schema::RateLimitConfig;
pub use schema::StaticPaths;
pub use schema::UploadConfig;
