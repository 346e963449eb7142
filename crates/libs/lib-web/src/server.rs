//! # Server Setup
//!
//! Tracing initialization, route registration and HTTP server startup.
//!
//! ## Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `OPTIONS *` | answered by [`apply_cors`] |
//! | `GET /ws` | [`handlers::websocket::chat_websocket`] |
//! | `GET /health` | [`handlers::health::service_health`] |
//! | `/api/*` | [`handlers::api::routes`] |
//! | anything else | [`handlers::health::banner`] |

// region: --- Imports
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, Response};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::Router;
use lib_core::{AppError, Config};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Span};
use tracing_subscriber::EnvFilter;

use crate::chat::ChatAppState;
use crate::handlers;
use crate::middleware::{apply_cors, log_requests, map_res, stamp_req, RequestStamp};
// endregion: --- Imports

// region: --- Tracing
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Install the global tracing subscriber.
///
/// The level comes from `LOG_LEVEL` (`trace|debug|info|warn|error`); anything
/// else falls back to `info`. Returns the level actually used.
pub fn init_tracing() -> anyhow::Result<String> {
    let log_level = std::env::var("LOG_LEVEL")
        .map(|level| level.trim().to_lowercase())
        .ok()
        .filter(|level| LOG_LEVELS.contains(&level.as_str()))
        .unwrap_or_else(|| "info".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_level))
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(log_level)
}
// endregion: --- Tracing

// region: --- Server Setup
/// Load configuration, build the relay state and serve until Ctrl-C / SIGTERM.
///
/// # Errors
///
/// - the tracing subscriber is already installed
/// - configuration is missing, unparsable or out of range
/// - the bind address cannot be bound
pub async fn start_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = init_tracing()?;
    info!(" CHATHUB RELAY STARTING");
    info!(" Log level: {}", log_level);

    info!("Loading configuration...");
    let config = Config::from_env()?;
    config.validate()?;
    info!(
        bind_address = %config.bind_address,
        service = %config.service_name,
        history_capacity = config.history_capacity,
        idle_timeout = ?config.idle_timeout,
        heartbeat_interval = ?config.heartbeat_interval,
        "Configuration loaded"
    );

    let bind_address = config.bind_address.clone();
    let state = Arc::new(ChatAppState::new(config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!(" SERVER READY: http://{}", bind_address);
    log_server_info();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(" SERVER STOPPED");
    Ok(())
}

/// Create the application router with all routes and middleware.
pub fn create_router(state: Arc<ChatAppState>) -> Router {
    info!("[ROUTE SETUP] Registering HTTP routes...");

    let routes = Router::new()
        .route("/ws", any(handlers::websocket::chat_websocket))
        .route("/health", get(handlers::health::service_health))
        // Only `/api/...` belongs to the API; the bare prefix gets the banner
        .route("/api", any(handlers::health::banner))
        .nest("/api", handlers::api::routes())
        .fallback(handlers::health::banner)
        .method_not_allowed_fallback(handlers::health::banner)
        .with_state(state);

    layered(routes)
}

/// Wrap routes in the middleware stack (outermost last).
fn layered(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(apply_cors))
        .layer(from_fn(map_res))
        .layer(from_fn(log_requests))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_failure(
                    |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        // Outermost: the request id must exist before the span is created
        .layer(from_fn(stamp_req))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response<axum::body::Body> {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    error!(detail = %detail, "[PANIC] Handler panicked: {}", detail);
    AppError::Internal(detail).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!(" Shutdown signal received, draining connections...");
}

/// Log server information
fn log_server_info() {
    info!(" WEBSOCKET:");
    info!("   • GET  /ws  (Upgrade: websocket)");
    info!(" API:");
    info!("   • GET  /api/health");
    info!("   • GET  /api/stats");
    info!("   • GET  /api/messages?room={{room}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

// endregion: --- Tests
