//! Cross-origin policy.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer.
///
/// With no configured origins any origin is accepted, without credentials.
/// Otherwise only the listed origins are echoed back and credentials are allowed.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut origins = Vec::new();
    for origin in &config.allowed_origins {
        match origin.parse::<HeaderValue>() {
            Ok(value) => origins.push(value),
            Err(e) => tracing::error!(origin = %origin, error = %e, "Failed to parse CORS origin"),
        }
    }

    let layer = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .max_age(Duration::from_secs(60 * 60));

    if origins.is_empty() {
        layer.allow_origin(Any).allow_headers(Any)
    } else {
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                header::HeaderName::from_static("x-requested-with"),
            ])
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig, origin: &str) -> Option<HeaderValue> {
        let app = Router::new()
            .route("/api/products", get(|| async { "[]" }))
            .layer(cors_layer(config));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/products")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn open_policy_allows_any_origin() {
        let allowed = preflight(&CorsConfig::default(), "https://shop.example").await;
        assert_eq!(allowed.unwrap(), "*");
    }

    #[tokio::test]
    async fn listed_origins_only() {
        let config = CorsConfig {
            allowed_origins: vec!["https://farmerice.example".to_string()],
        };
        assert_eq!(
            preflight(&config, "https://farmerice.example").await.unwrap(),
            "https://farmerice.example"
        );
        assert!(preflight(&config, "https://evil.example").await.is_none());
    }
}
