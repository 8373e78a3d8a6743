//! HTTP server setup and the service-level handlers (health, debug).

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;

use super::task_store::{create_task_store, SharedTaskStore};
use super::tasks;
use super::types::{DebugResponse, ForwardingHeaders, HealthResponse};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Handle to the task store, shared by every request
    pub store: SharedTaskStore,
    /// Process start, for the uptime reported by `/api/health`
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: SharedTaskStore) -> Self {
        Self {
            config,
            store,
            started_at: process_started(),
        }
    }
}

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Instant of the first call in this process. `main` calls it before anything else.
pub fn process_started() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/api/health", get(health))
        .route("/api/debug", get(debug))
        .nest("/api/tasks", tasks::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fixed origin allow-list, the four CRUD methods, and JSON/auth headers.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Start the HTTP server.
///
/// Opens the task store first and fails if it is unreachable.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = create_task_store(&config.store).await?;
    tracing::info!(
        "Task store ready (driver={}, persistent={})",
        store.driver(),
        store.is_persistent()
    );

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, store));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint. Pings the store; 500 with `ok: false` if that fails.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check ping failed: {}", e);
            false
        }
    };
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(HealthResponse {
            ok,
            driver: state.store.driver().to_string(),
            uptime: state.started_at.elapsed().as_secs_f64(),
        }),
    )
}

/// Echo the peer address and forwarding headers.
async fn debug(ConnectInfo(peer): ConnectInfo<SocketAddr>, headers: HeaderMap) -> Json<DebugResponse> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(DebugResponse {
        ip: peer.ip().to_string(),
        headers: ForwardingHeaders {
            host: header("host"),
            x_real_ip: header("x-real-ip"),
            x_forwarded_for: header("x-forwarded-for"),
            x_forwarded_proto: header("x-forwarded-proto"),
        },
    })
}
