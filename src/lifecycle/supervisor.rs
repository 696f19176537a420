//! Process supervision: owns the running server and decides how it ends.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;
use crate::storage::DocumentStore;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped on request. Exit code 0.
    Graceful,
    /// Startup failure or crash. Exit code 1.
    Failure,
}

impl Outcome {
    pub fn code(self) -> i32 {
        match self {
            Outcome::Graceful => 0,
            Outcome::Failure => 1,
        }
    }
}

/// A running server plus everything needed to stop it.
pub struct Lifecycle {
    shutdown: Shutdown,
    server: JoinHandle<std::io::Result<()>>,
    store: Arc<dyn DocumentStore>,
    grace: Duration,
}

impl Lifecycle {
    pub fn new(
        shutdown: Shutdown,
        server: JoinHandle<std::io::Result<()>>,
        store: Arc<dyn DocumentStore>,
        grace: Duration,
    ) -> Self {
        Self {
            shutdown,
            server,
            store,
            grace,
        }
    }

    /// Run until `stop` resolves or the server task ends on its own.
    pub async fn supervise<F>(self, stop: F) -> Outcome
    where
        F: Future,
    {
        let Lifecycle {
            shutdown,
            mut server,
            store,
            grace,
        } = self;

        tokio::select! {
            _ = stop => {
                shutdown.trigger();
                let drained = tokio::time::timeout(grace, async {
                    if let Ok(Err(e)) = (&mut server).await {
                        tracing::warn!(error = %e, "Server reported an error while stopping");
                    }
                    store.close().await;
                })
                .await;

                if drained.is_err() {
                    server.abort();
                    tracing::warn!(grace_secs = grace.as_secs_f64(), "Forced shutdown after grace period");
                } else {
                    tracing::info!("Graceful shutdown complete");
                }
                Outcome::Graceful
            }
            result = &mut server => {
                match result {
                    Ok(Ok(())) => tracing::error!("Server stopped unexpectedly"),
                    Ok(Err(e)) => tracing::error!(error = %e, "Server failed"),
                    Err(e) if e.is_panic() => tracing::error!(error = %e, "Server task panicked"),
                    Err(e) => tracing::error!(error = %e, "Server task aborted"),
                }
                shutdown.trigger();
                close_store(store, grace).await;
                Outcome::Failure
            }
        }
    }
}

/// Close the store, giving up after `grace`.
pub async fn close_store(store: Arc<dyn DocumentStore>, grace: Duration) {
    if tokio::time::timeout(grace, store.close()).await.is_err() {
        tracing::warn!("Timed out closing the document store");
    }
}
