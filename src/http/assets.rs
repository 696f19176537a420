//! Static file serving.
//!
//! # Responsibilities
//! - Serve `/uploads` and `/public` with permissive cross-origin headers
//! - Answer missing upload images with a placeholder SVG
//! - Serve the bundled frontend (production only), falling back to its index
//!
//! # Design Decisions
//! - Path resolution and traversal checks are left to `ServeDir`
//! - Missing non-image uploads use the regular JSON 404

use std::convert::Infallible;
use std::path::Path;

use axum::{
    body::Body,
    extract::OriginalUri,
    http::{header, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tower::service_fn;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::error::ApiError;

const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "webp", "svg", "avif", "bmp"];

pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="400" viewBox="0 0 400 400">
  <rect width="400" height="400" fill="#f3f4f6"/>
  <path d="M150 250l40-50 30 36 20-24 40 38H150z" fill="#cbd5e1"/>
  <circle cx="245" cy="165" r="16" fill="#cbd5e1"/>
  <text x="200" y="310" font-family="sans-serif" font-size="20" fill="#94a3b8" text-anchor="middle">No Image</text>
</svg>
"##;

/// Whether `path` names an image by its extension.
pub fn is_image_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|image| image.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn placeholder_image() -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        PLACEHOLDER_SVG,
    )
        .into_response()
}

async fn missing_upload(request: Request<Body>) -> Result<Response, Infallible> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if is_image_path(&path) {
        tracing::debug!(path = %path, "Upload missing, serving placeholder image");
        return Ok(placeholder_image());
    }
    Ok(ApiError::route_not_found(&path).into_response())
}

async fn missing_asset(request: Request<Body>) -> Result<Response, Infallible> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    Ok(ApiError::route_not_found(&path).into_response())
}

fn with_cross_origin_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CROSS_ORIGIN_RESOURCE_POLICY,
            HeaderValue::from_static("cross-origin"),
        ))
}

/// Service for `/uploads`.
pub fn uploads_router(dir: &Path) -> Router {
    let files = ServeDir::new(dir).fallback(service_fn(missing_upload));
    with_cross_origin_headers(Router::new().fallback_service(files))
}

/// Service for `/public`.
pub fn public_router(dir: &Path) -> Router {
    let files = ServeDir::new(dir).fallback(service_fn(missing_asset));
    with_cross_origin_headers(Router::new().fallback_service(files))
}

/// Frontend bundle: existing files as-is, every other path gets `index.html`.
///
/// Without an `index.html` the bundle is served as plain files and misses
/// fall through to the JSON 404.
pub fn frontend_router(dir: &Path) -> Router {
    let index = dir.join("index.html");
    if index.is_file() {
        return Router::new()
            .fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    tracing::warn!(index = %index.display(), "Frontend index.html not found");
    Router::new().fallback_service(ServeDir::new(dir).fallback(service_fn(missing_asset)))
}
