//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Connect store → Prepare directories → Bind listener → Serve
//!
//! Supervision (supervisor.rs):
//!     Signal received → Stop accepting → Drain connections → Close store → Exit 0
//!     Server task dies → Close store → Exit 1
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced exit after deadline

pub mod crash;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::{Lifecycle, Outcome};
