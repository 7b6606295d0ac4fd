//! Per-move evaluation of a position.
//!
//! Every legal move is evaluated strictly sequentially: the moves share one
//! engine session, and interleaving searches from one batch with another
//! caller's would make the node/depth figures meaningless. Each move is
//! applied to a scratch copy of the position, so the caller's position is
//! never mutated.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use crate::engine::SearchLimit;
use crate::error::AnalysisError;
use crate::score::WhiteScore;
use crate::session::Analyze;

/// Evaluation of a single legal move, immutable once produced.
///
/// A move whose analysis failed carries `None` in every analysis field; the
/// batch as a whole still succeeds (partial-failure policy).
#[derive(Debug, Clone)]
pub struct MoveEvaluation {
    /// The move in UCI notation (e.g. "e2e4").
    pub mv: String,
    /// White-perspective score of the position after the move.
    pub score: Option<WhiteScore>,
    /// Best reply the engine expects, from its principal variation.
    pub best_response: Option<String>,
    /// Search depth reached.
    pub depth: Option<u32>,
    /// Number of nodes searched.
    pub nodes: Option<u64>,
}

impl MoveEvaluation {
    /// The null-filled record for a move whose analysis failed.
    fn failed(mv: String) -> Self {
        Self {
            mv,
            score: None,
            best_response: None,
            depth: None,
            nodes: None,
        }
    }

    /// White's advantage in pawns; `None` for forced mates and failed
    /// analyses.
    pub fn white_advantage(&self) -> Option<f64> {
        self.score.and_then(|s| s.advantage())
    }

    /// Whether the move leads to a forced mate.
    pub fn is_mate(&self) -> bool {
        self.score.is_some_and(|s| s.is_mate())
    }

    /// Signed mate distance; positive means white mates.
    pub fn mate_in(&self) -> Option<i32> {
        self.score.and_then(|s| s.mate_in())
    }
}

/// Evaluate every legal move of `position` under `limit`.
///
/// Moves come back in the rules library's enumeration order; ranking is the
/// aggregator's job. A position with no legal moves yields an empty vector;
/// the caller distinguishes checkmate from stalemate by inspecting the
/// position itself.
///
/// # Errors
///
/// `EngineUnavailable` if the session is not started. A per-move
/// `AnalysisFailed` is degraded to a null-filled record instead.
pub fn evaluate_all_moves<S: Analyze + ?Sized>(
    session: &S,
    position: &Chess,
    limit: &SearchLimit,
) -> Result<Vec<MoveEvaluation>, AnalysisError> {
    let legal = position.legal_moves();
    let mut evaluations = Vec::with_capacity(legal.len());

    for m in &legal {
        let uci = m.to_uci(CastlingMode::Standard).to_string();

        let mut child = position.clone();
        child.play_unchecked(m);
        let mover = child.turn();
        let fen = Fen::from_position(child, EnPassantMode::Legal).to_string();

        match session.analyze(&fen, limit) {
            Ok(result) => evaluations.push(MoveEvaluation {
                score: WhiteScore::from_engine(&result, mover),
                best_response: result.pv.first().cloned(),
                depth: result.depth,
                nodes: result.nodes,
                mv: uci,
            }),
            Err(AnalysisError::AnalysisFailed(reason)) => {
                tracing::debug!("Analysis failed for move {}: {}", uci, reason);
                evaluations.push(MoveEvaluation::failed(uci));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(evaluations)
}
