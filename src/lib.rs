//! FarmeRice backend library

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod storage;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
