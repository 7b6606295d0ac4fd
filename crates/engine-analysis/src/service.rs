//! Analysis service façade.
//!
//! Composes record parsing, limit clamping, per-move evaluation, ranking,
//! and summarization into the two operations the transport layer exposes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::{Color, EnPassantMode, Position};

use crate::engine::SearchLimit;
use crate::error::AnalysisError;
use crate::evaluator::{self, MoveEvaluation};
use crate::rank::{self, BestMoveSummary};
use crate::record::StateRecord;
use crate::session::Analyze;

/// Tunable service options, loaded from configuration by the hosting
/// server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOptions {
    /// Time budget in seconds used when a request carries no limit.
    #[serde(default = "default_time")]
    pub default_time: f64,
    /// Ceiling silently applied to requested time budgets.
    #[serde(default = "default_max_time")]
    pub max_time: f64,
    /// Fixed search depth; takes precedence over any time budget when set.
    #[serde(default)]
    pub depth: Option<u32>,
}

fn default_time() -> f64 {
    1.0
}

fn default_max_time() -> f64 {
    10.0
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            default_time: default_time(),
            max_time: default_max_time(),
            depth: None,
        }
    }
}

/// Complete analysis of one position: every legal move evaluated and
/// ranked, plus the whole-position best-move summary. Constructed once per
/// request and not mutated afterwards.
#[derive(Debug, Clone)]
pub struct PositionAnalysis {
    /// FEN of the analyzed position, as normalized by the rules library.
    pub fen: String,
    /// Side to move, taken from the FEN.
    pub turn: Color,
    /// Total number of legal moves.
    pub total_moves: usize,
    /// Per-move evaluations, sorted by descending white advantage.
    pub moves: Vec<MoveEvaluation>,
    /// Best move and line for the position as a whole.
    pub summary: BestMoveSummary,
}

/// Façade over one engine session.
///
/// The session is injected rather than owned globally so the single-engine
/// constraint stays visible and a test can substitute a fake.
pub struct AnalysisService<S: Analyze> {
    session: Arc<S>,
    options: ServiceOptions,
}

impl<S: Analyze> AnalysisService<S> {
    /// Create a service over `session` with the given options.
    pub fn new(session: Arc<S>, options: ServiceOptions) -> Self {
        Self { session, options }
    }

    /// Fully analyze the position in `record`: evaluate and rank every
    /// legal move, then attach the whole-position best-move summary.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a malformed record or non-positive time limit;
    /// `EngineUnavailable`/`AnalysisFailed` for engine problems, except the
    /// per-move degradation documented on
    /// [`evaluate_all_moves`](crate::evaluator::evaluate_all_moves).
    pub fn analyze_position(
        &self,
        record: &str,
        time_limit: Option<f64>,
    ) -> Result<PositionAnalysis, AnalysisError> {
        let record = StateRecord::parse(record)?;
        let limit = self.limit_for(time_limit)?;
        let position = record.position()?;

        let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();
        let turn = position.turn();

        let evaluations = evaluator::evaluate_all_moves(self.session.as_ref(), &position, &limit)?;
        let moves = rank::rank(evaluations);
        let summary = rank::summarize(self.session.as_ref(), &position, &limit)?;

        Ok(PositionAnalysis {
            fen,
            turn,
            total_moves: moves.len(),
            moves,
            summary,
        })
    }

    /// Return only the whole-position best-move summary, skipping the
    /// per-move enumeration entirely.
    pub fn best_move(
        &self,
        record: &str,
        time_limit: Option<f64>,
    ) -> Result<BestMoveSummary, AnalysisError> {
        let record = StateRecord::parse(record)?;
        let limit = self.limit_for(time_limit)?;
        let position = record.position()?;

        rank::summarize(self.session.as_ref(), &position, &limit)
    }

    /// Resolve the search limit for one request.
    ///
    /// A configured depth wins over any time budget. Time budgets above the
    /// ceiling are clamped down to it; a budget below the default is honored
    /// as given.
    fn limit_for(&self, time_limit: Option<f64>) -> Result<SearchLimit, AnalysisError> {
        if let Some(depth) = self.options.depth {
            return Ok(SearchLimit::Depth(depth));
        }
        let seconds = match time_limit {
            Some(t) if t <= 0.0 => {
                return Err(AnalysisError::InvalidInput(format!(
                    "time limit must be positive, got {t}"
                )))
            }
            Some(t) => t.min(self.options.max_time),
            None => self.options.default_time,
        };
        Ok(SearchLimit::MoveTime(seconds))
    }
}
