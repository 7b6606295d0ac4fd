//! HTTP handlers and wire types for the analysis API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shakmaty::Color;

use engine_analysis::{AnalysisError, BestMoveSummary, MoveEvaluation, PositionAnalysis};

use crate::AppState;

/// Request body for both analysis endpoints.
#[derive(Debug, Deserialize)]
pub struct StateStringRequest {
    /// Chess position in the format `"turn::fen::arrows"`.
    pub state_string: String,
    /// Analysis time in seconds; the configured default applies when absent.
    #[serde(default)]
    pub time_limit: Option<f64>,
}

/// Analysis of a single move.
#[derive(Debug, Serialize)]
pub struct MoveReport {
    /// Move in UCI notation.
    #[serde(rename = "move")]
    pub mv: String,
    /// White's advantage in pawns; `null` for forced mates and failed
    /// analyses.
    pub white_advantage: Option<f64>,
    /// Whether this move leads to a forced mate.
    pub is_mate: bool,
    /// Signed mate distance; positive means white mates.
    pub mate_in: Option<i32>,
    /// Best response to this move.
    pub best_response: Option<String>,
    /// Search depth reached.
    pub depth_reached: Option<u32>,
    /// Number of nodes searched.
    pub nodes_searched: Option<u64>,
}

impl From<MoveEvaluation> for MoveReport {
    fn from(evaluation: MoveEvaluation) -> Self {
        Self {
            white_advantage: evaluation.white_advantage(),
            is_mate: evaluation.is_mate(),
            mate_in: evaluation.mate_in(),
            best_response: evaluation.best_response.clone(),
            depth_reached: evaluation.depth,
            nodes_searched: evaluation.nodes,
            mv: evaluation.mv,
        }
    }
}

/// Best move for a position.
#[derive(Debug, Serialize)]
pub struct BestMoveReport {
    /// Best move in UCI notation.
    pub best_move: Option<String>,
    /// White's advantage in pawns; `null` for forced mates.
    pub advantage: Option<f64>,
    /// Whether the position is a forced mate.
    pub is_mate: bool,
    /// Signed mate distance; positive means white mates.
    pub mate_in: Option<i32>,
    /// Search depth reached.
    pub depth_reached: Option<u32>,
    /// Number of nodes searched.
    pub nodes_searched: Option<u64>,
    /// Best continuation, at most five plies.
    pub principal_variation: Vec<String>,
}

impl From<BestMoveSummary> for BestMoveReport {
    fn from(summary: BestMoveSummary) -> Self {
        Self {
            advantage: summary.advantage(),
            is_mate: summary.is_mate(),
            mate_in: summary.mate_in(),
            best_move: summary.best_move,
            depth_reached: summary.depth,
            nodes_searched: summary.nodes,
            principal_variation: summary.pv,
        }
    }
}

/// Complete board analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    /// FEN of the analyzed position.
    pub fen: String,
    /// Whose turn it is, from the FEN.
    pub turn: String,
    /// Total number of legal moves.
    pub total_moves: usize,
    /// All legal moves, best first.
    pub moves: Vec<MoveReport>,
    /// Whole-position best-move summary, merged into the top level.
    #[serde(flatten)]
    pub best: BestMoveReport,
}

impl From<PositionAnalysis> for AnalysisReport {
    fn from(analysis: PositionAnalysis) -> Self {
        Self {
            fen: analysis.fen,
            turn: color_name(analysis.turn).to_string(),
            total_moves: analysis.total_moves,
            moves: analysis.moves.into_iter().map(MoveReport::from).collect(),
            best: analysis.summary.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub endpoints: HashMap<&'static str, &'static str>,
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Map a service error onto the HTTP status space.
fn into_response_error(err: AnalysisError) -> (StatusCode, String) {
    let status = match err {
        AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AnalysisError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::AnalysisFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Plain-text liveness probe.
pub async fn liveness() -> &'static str {
    "ok"
}

/// GET /api/v1/
pub async fn api_info() -> Json<ApiInfo> {
    let mut endpoints = HashMap::new();
    endpoints.insert(
        "/api/v1/analyze",
        "POST - Complete board analysis with all moves",
    );
    endpoints.insert("/api/v1/best-move", "POST - Get best move only");
    endpoints.insert("/api/v1/health", "GET - Health check");

    Json(ApiInfo {
        message: "Chess Analysis API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    if state.session.is_ready() {
        Json(HealthReport {
            status: "healthy".to_string(),
            engine: Some("stockfish".to_string()),
            engine_path: Some(state.session.engine_path().to_string()),
            error: None,
        })
    } else {
        Json(HealthReport {
            status: "unhealthy".to_string(),
            engine: None,
            engine_path: None,
            error: Some("Chess engine not ready".to_string()),
        })
    }
}

/// POST /api/v1/analyze
///
/// Analyzes a chess position and returns all legal moves with their
/// evaluations plus the best-move summary.
///
/// # Errors
/// * 400 Bad Request - malformed state string or time limit
/// * 503 Service Unavailable - engine session not available
/// * 500 Internal Server Error - analysis failed
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<StateStringRequest>,
) -> Result<Json<AnalysisReport>, (StatusCode, String)> {
    let service = Arc::clone(&state.service);
    let analysis = tokio::task::spawn_blocking(move || {
        service.analyze_position(&request.state_string, request.time_limit)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Analysis task failed: {e}"),
        )
    })?
    .map_err(into_response_error)?;

    Ok(Json(analysis.into()))
}

/// POST /api/v1/best-move
///
/// Returns only the best move for a chess position.
///
/// # Errors
/// * 400 Bad Request - malformed state string or time limit
/// * 503 Service Unavailable - engine session not available
/// * 500 Internal Server Error - analysis failed
pub async fn best_move(
    State(state): State<AppState>,
    Json(request): Json<StateStringRequest>,
) -> Result<Json<BestMoveReport>, (StatusCode, String)> {
    let service = Arc::clone(&state.service);
    let summary = tokio::task::spawn_blocking(move || {
        service.best_move(&request.state_string, request.time_limit)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Analysis task failed: {e}"),
        )
    })?
    .map_err(into_response_error)?;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_analysis::{AnalysisService, EngineSession, ServiceOptions, WhiteScore};

    fn unready_state() -> AppState {
        let session = Arc::new(EngineSession::new("stockfish"));
        let service = Arc::new(AnalysisService::new(
            Arc::clone(&session),
            ServiceOptions::default(),
        ));
        AppState { service, session }
    }

    #[test]
    fn test_state_string_request_deserialize_without_time_limit() {
        let json = r#"{"state_string": "white::fen::"}"#;
        let request: StateStringRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.state_string, "white::fen::");
        assert_eq!(request.time_limit, None);
    }

    #[test]
    fn test_move_report_uses_move_key_and_derived_fields() {
        let evaluation = MoveEvaluation {
            mv: "e2e4".to_string(),
            score: Some(WhiteScore::Pawns(-0.5)),
            best_response: Some("e7e5".to_string()),
            depth: Some(12),
            nodes: Some(4096),
        };
        let report = MoveReport::from(evaluation);
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"move\":\"e2e4\""));
        assert!(json.contains("\"white_advantage\":-0.5"));
        assert!(json.contains("\"is_mate\":false"));
        assert!(json.contains("\"depth_reached\":12"));
        assert!(json.contains("\"nodes_searched\":4096"));
    }

    #[test]
    fn test_failed_move_report_is_null_filled() {
        let evaluation = MoveEvaluation {
            mv: "g1f3".to_string(),
            score: None,
            best_response: None,
            depth: None,
            nodes: None,
        };
        let report = MoveReport::from(evaluation);
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"white_advantage\":null"));
        assert!(json.contains("\"mate_in\":null"));
        assert!(json.contains("\"best_response\":null"));
    }

    #[test]
    fn test_analysis_report_flattens_summary() {
        let summary = BestMoveSummary {
            best_move: Some("e2e4".to_string()),
            score: Some(WhiteScore::Pawns(0.35)),
            depth: Some(18),
            nodes: Some(123_456),
            pv: vec!["e2e4".to_string(), "e7e5".to_string()],
        };
        let report = AnalysisReport {
            fen: "fen".to_string(),
            turn: "white".to_string(),
            total_moves: 20,
            moves: Vec::new(),
            best: summary.into(),
        };
        let json = serde_json::to_string(&report).unwrap();

        // The summary fields sit at the top level, next to fen/turn/moves.
        assert!(json.contains("\"best_move\":\"e2e4\""));
        assert!(json.contains("\"principal_variation\":[\"e2e4\",\"e7e5\"]"));
        assert!(json.contains("\"total_moves\":20"));
    }

    #[test]
    fn test_mate_summary_has_null_advantage() {
        let summary = BestMoveSummary {
            best_move: Some("h5f7".to_string()),
            score: Some(WhiteScore::MateIn {
                plies: 1,
                winner: Color::White,
            }),
            depth: Some(5),
            nodes: Some(999),
            pv: vec!["h5f7".to_string()],
        };
        let report = BestMoveReport::from(summary);

        assert!(report.is_mate);
        assert_eq!(report.advantage, None);
        assert_eq!(report.mate_in, Some(1));
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, _) =
            into_response_error(AnalysisError::InvalidInput("bad turn".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            into_response_error(AnalysisError::EngineUnavailable("not started".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, message) =
            into_response_error(AnalysisError::AnalysisFailed("engine died".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("engine died"));
    }

    #[tokio::test]
    async fn test_liveness_returns_ok() {
        assert_eq!(liveness().await, "ok");
    }

    #[tokio::test]
    async fn test_api_info_lists_endpoints() {
        let info = api_info().await.0;
        assert_eq!(info.message, "Chess Analysis API");
        assert!(info.endpoints.contains_key("/api/v1/analyze"));
        assert!(info.endpoints.contains_key("/api/v1/best-move"));
        assert!(info.endpoints.contains_key("/api/v1/health"));
    }

    #[tokio::test]
    async fn test_health_reports_unready_session() {
        let report = health(State(unready_state())).await.0;
        assert_eq!(report.status, "unhealthy");
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_analyze_without_engine_is_service_unavailable() {
        let request = StateStringRequest {
            state_string:
                "white::rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1::".to_string(),
            time_limit: None,
        };
        let result = analyze(State(unready_state()), Json(request)).await;
        match result {
            Err((status, _)) => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
            Ok(_) => panic!("expected an error without a started engine"),
        }
    }

    #[tokio::test]
    async fn test_best_move_with_bad_record_is_bad_request() {
        let request = StateStringRequest {
            state_string: "no-separators-here".to_string(),
            time_limit: None,
        };
        let result = best_move(State(unready_state()), Json(request)).await;
        match result {
            Err((status, _)) => assert_eq!(status, StatusCode::BAD_REQUEST),
            Ok(_) => panic!("expected a parse failure"),
        }
    }
}
