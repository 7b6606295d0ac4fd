//! Chess analysis server.
//!
//! An Axum-based web server exposing position evaluation backed by a single
//! long-lived UCI engine session:
//! - `POST /api/v1/analyze` - every legal move evaluated and ranked
//! - `POST /api/v1/best-move` - best move and principal variation only
//! - `GET /api/v1/health` - engine readiness

mod api;
mod config;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use config::ServerConfig;
use engine_analysis::{AnalysisService, EngineSession};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The analysis façade over the engine session.
    pub service: Arc<AnalysisService<EngineSession>>,
    /// The session itself, for the health surface and shutdown.
    pub session: Arc<EngineSession>,
}

/// CORS layer for the configured origins; an empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::load().expect("Failed to load configuration");

    // Refuse to come up without an engine: accepting requests we cannot
    // fulfill is worse than not starting.
    let engine_path = config
        .find_engine()
        .expect("No UCI engine found; install Stockfish or set engine_paths in analysis.toml");
    let session = Arc::new(EngineSession::new(engine_path));
    session.start().expect("Failed to start engine session");

    let service = Arc::new(AnalysisService::new(
        Arc::clone(&session),
        config.analysis.clone(),
    ));
    let state = AppState {
        service,
        session: Arc::clone(&session),
    };

    let app = Router::new()
        .route("/health", get(api::liveness))
        .route("/api/v1/", get(api::api_info))
        .route("/api/v1/health", get(api::health))
        .route("/api/v1/analyze", post(api::analyze))
        .route("/api/v1/best-move", post(api::best_move))
        .with_state(state)
        .layer(cors_layer(&config.cors_origins));

    let addr = config.bind_addr();
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Engine teardown happens once, outside the request path.
    session.stop();
}
