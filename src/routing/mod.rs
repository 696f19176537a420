//! API route registration.
//!
//! # Layout
//! ```text
//! /api
//!   /auth            reserved (501)
//!   /upload          multipart uploads
//!   /users ... /announcements   document CRUD, one collection each
//!   anything else    JSON 404
//! ```

pub mod auth;
pub mod resources;
pub mod upload;

use std::sync::Arc;

use axum::Router;

use crate::config::{StaticPaths, UploadConfig};
use crate::http::error;
use crate::storage::DocumentStore;

pub use resources::Resource;

/// Build the router mounted at `/api`.
pub fn api_router(
    store: Arc<dyn DocumentStore>,
    paths: &StaticPaths,
    uploads: &UploadConfig,
) -> Router {
    let mut router = Router::new()
        .nest("/auth", auth::router())
        .nest(
            "/upload",
            upload::router(paths.uploads.clone(), uploads.clone()),
        );

    for resource in Resource::ALL {
        let path = format!("/{}", resource.segment());
        router = router.nest(&path, resources::router(resource, store.clone()));
    }

    router.fallback(error::not_found)
}
