//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panics, limits, CORS,
//!   compression, security headers, metrics, rate limiting)
//! - Serve static assets and, in production, the frontend bundle
//! - Bind server to listener and stop on the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer, extract::DefaultBodyLimit, middleware, routing::get, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::health;
use crate::http::{assets, error, request};
use crate::observability::metrics;
use crate::routing;
use crate::security::{cors::cors_layer, headers::security_headers};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::storage::DocumentStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

/// HTTP server for the FarmeRice API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
    limiter: Option<Arc<RateLimiter>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let config = Arc::new(config);
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::new(&config.rate_limit)));

        let state = AppState {
            store,
            config: config.clone(),
        };

        let router = Self::build_router(&config, state, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState, limiter: Option<Arc<RateLimiter>>) -> Router {
        let paths = config.static_paths();

        let mut api = routing::api_router(state.store.clone(), &paths, &config.uploads);
        if let Some(limiter) = limiter {
            api = api.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        let mut router = Router::new()
            .route("/health", get(health::health_check))
            .route("/health/ready", get(health::readiness))
            .method_not_allowed_fallback(error::not_found)
            .with_state(state)
            .nest("/api", api)
            .nest_service("/uploads", assets::uploads_router(&paths.uploads))
            .nest_service("/public", assets::public_router(&paths.public));

        router = match &paths.frontend {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "Serving frontend bundle");
                router.fallback_service(assets::frontend_router(dir))
            }
            None => router.fallback(error::not_found),
        };

        router = router.layer(middleware::from_fn(metrics::track_requests));
        if config.security.enable_headers {
            router = router.layer(middleware::from_fn(security_headers));
        }

        router
            .layer(CompressionLayer::new())
            .layer(cors_layer(&config.cors))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(error::handle_timeout))
                    .timeout(Duration::from_secs(config.server.request_timeout_secs)),
            )
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
            .layer(CatchPanicLayer::custom(error::panic_response))
            .layer(request::propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(request::set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        if let Some(limiter) = self.limiter.clone() {
            tokio::spawn(limiter.run_sweeper(shutdown.resubscribe()));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
