//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the document store
//! - Prepare static asset directories
//! - Bind the listener and hand the running server to the supervisor
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal (exit code 1)
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::future::Future;

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::supervisor::{close_store, Lifecycle, Outcome};
use crate::storage;

/// Start the backend and run it until `stop` resolves.
pub async fn launch<F>(config: AppConfig, stop: F) -> Outcome
where
    F: Future,
{
    let grace = config.shutdown.grace();

    let store = match storage::connect(&config.database).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to the database");
            return Outcome::Failure;
        }
    };

    let paths = config.static_paths();
    if let Err(e) = tokio::fs::create_dir_all(&paths.uploads).await {
        tracing::error!(dir = %paths.uploads.display(), error = %e, "Failed to create uploads directory");
        close_store(store, grace).await;
        return Outcome::Failure;
    }

    let bind_address = config.server.bind_address();
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_address, error = %e, "Failed to bind listener");
            close_store(store, grace).await;
            return Outcome::Failure;
        }
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Lifecycle::new(shutdown, handle, store, grace)
        .supervise(stop)
        .await
}
