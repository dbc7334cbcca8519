//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the service endpoints (`/`, `/health`)
//! - Wire up middleware (request ID, request logging, timeout, panic handling)
//! - Bind server to listener
//! - Keep the process emitting logs from start to graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::AppConfig;
use crate::http::middleware::{request_logging, PanicResponder};
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::logging::record::format_timestamp;
use crate::logging::Emitter;

/// Service version reported by `/` and `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
}

/// HTTP server for the elections API process.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server logging requests through `emitter`.
    pub fn new(config: AppConfig, emitter: Emitter) -> Self {
        let state = AppState {
            started_at: Utc::now(),
        };
        let router = Self::build_router(&config, state, emitter);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost first: request ID, request logging, timeout,
    /// panic handling. Logging sits outside the panic handler so a panic is
    /// also recorded as a completed 500.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, emitter: Emitter) -> Router {
        Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(PanicResponder::new(emitter.clone())))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(emitter, request_logging))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "API started"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("API stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Elections API",
        "version": VERSION,
        "status": "active",
        "health_check": "/health",
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let now = Utc::now();
    Json(json!({
        "status": "healthy",
        "timestamp": format_timestamp(&now),
        "uptime_secs": (now - state.started_at).num_seconds(),
        "version": VERSION,
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
