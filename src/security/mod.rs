//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin allow-list, preflight)
//!     → headers.rs (hardening headers on every response)
//!     → rate_limit.rs (per-client window, `/api` only)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - No trust in client input (forwarded headers opt-in only)

pub mod cors;
pub mod headers;
pub mod rate_limit;
