//! Authentication mount point.
//!
//! The `/api/auth` prefix is reserved; no authentication flows are served
//! here, so every request is answered with 501.

use axum::{http::Method, routing::any, Router};

use crate::http::error::ApiError;

pub fn router() -> Router {
    Router::new()
        .route("/", any(unavailable))
        .route("/{*rest}", any(unavailable))
}

async fn unavailable(method: Method) -> ApiError {
    tracing::debug!(method = %method, "Authentication request rejected");
    ApiError::NotImplemented("Authentication is not available on this server".to_string())
}
