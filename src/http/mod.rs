//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request ID, JSON body extraction)
//!     → [routing layer picks a handler]
//!     → response.rs (JSON envelopes)
//!     → error.rs (every failure becomes `{ success: false, message }`)
//!     → Send to client
//! ```
//!
//! Static files (`/uploads`, `/public`, frontend bundle) are served by
//! assets.rs outside the JSON pipeline.

pub mod assets;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::{ApiJson, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
