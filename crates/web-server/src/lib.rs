use analytics::{AccuracyEngine, Clock, SystemClock};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::Config;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};
// Note: Tracing is handled by whichever binary starts the server.

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
///
/// The server is stateless with respect to predictions: every request carries
/// the records it wants evaluated.
pub struct AppState {
    pub engine: AccuracyEngine<Arc<dyn Clock>>,
    pub default_page_limit: usize,
}

impl AppState {
    pub fn new(clock: Arc<dyn Clock>, default_page_limit: usize) -> Self {
        Self {
            engine: AccuracyEngine::with_clock(clock),
            default_page_limit,
        }
    }
}

/// Builds the router with all routes and middleware attached.
pub fn create_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/predictions/metrics", post(handlers::compute_metrics))
        .route("/api/predictions/performance", post(handlers::summarize))
        .route("/api/predictions/performance/by-user", post(handlers::summarize_by_user))
        .route("/api/predictions/query", post(handlers::query))
        .route("/api/predictions/:prediction_id/actual", post(handlers::record_actual))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
}

/// The main function to configure and run the web server.
///
/// Runs until the process receives Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let state = Arc::new(AppState::new(
        Arc::new(SystemClock),
        config.analytics.default_page_limit,
    ));
    let app = create_router(state, config.server.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal.");
    }
}
