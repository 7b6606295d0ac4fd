//! Ranking of per-move results and best-move summarization.
//!
//! Mate scores have no centipawn value, yet the ranked move list needs one
//! total order over both. The sentinel substitution that makes that work
//! lives in [`effective_pawns`] and nowhere else.

use shakmaty::fen::Fen;
use shakmaty::{Chess, Color, EnPassantMode, Position};

use crate::engine::SearchLimit;
use crate::error::AnalysisError;
use crate::evaluator::MoveEvaluation;
use crate::score::WhiteScore;
use crate::session::Analyze;

/// Rank base for forced mates, far outside any centipawn evaluation an
/// engine reports. Shorter mates rank more extreme.
const MATE_RANK: f64 = 100_000.0;

/// Rank for moves whose analysis failed: below every real evaluation, but
/// above "white gets mated". A failed probe must not outrank a provably
/// lost line.
const FAILED_RANK: f64 = -999.0;

/// Maximum number of principal-variation plies kept in a summary.
pub const PV_PLIES: usize = 5;

/// The single total order over mate, numeric, and failed evaluations.
///
/// White delivering mate maps just under `MATE_RANK`, white being mated
/// just above `-MATE_RANK`, so every mate stays outside the centipawn
/// range while mate distances still order among themselves.
pub fn effective_pawns(score: Option<WhiteScore>) -> f64 {
    match score {
        Some(WhiteScore::Pawns(pawns)) => pawns,
        Some(WhiteScore::MateIn {
            plies,
            winner: Color::White,
        }) => MATE_RANK - f64::from(plies),
        Some(WhiteScore::MateIn {
            plies,
            winner: Color::Black,
        }) => -MATE_RANK + f64::from(plies),
        None => FAILED_RANK,
    }
}

/// Sort evaluations by descending white advantage.
///
/// The sort is stable, so ties keep the rules library's enumeration order.
pub fn rank(mut evaluations: Vec<MoveEvaluation>) -> Vec<MoveEvaluation> {
    evaluations.sort_by(|a, b| effective_pawns(b.score).total_cmp(&effective_pawns(a.score)));
    evaluations
}

/// Best move and line for a position as a whole.
#[derive(Debug, Clone)]
pub struct BestMoveSummary {
    /// Best move in UCI notation; `None` when the position has no moves.
    pub best_move: Option<String>,
    /// White-perspective score of the position.
    pub score: Option<WhiteScore>,
    /// Search depth reached.
    pub depth: Option<u32>,
    /// Number of nodes searched.
    pub nodes: Option<u64>,
    /// Principal variation, truncated to [`PV_PLIES`] plies.
    pub pv: Vec<String>,
}

impl BestMoveSummary {
    /// White's advantage in pawns; `None` when the line is forced mate.
    pub fn advantage(&self) -> Option<f64> {
        self.score.and_then(|s| s.advantage())
    }

    /// Whether the position is a forced mate.
    pub fn is_mate(&self) -> bool {
        self.score.is_some_and(|s| s.is_mate())
    }

    /// Signed mate distance; positive means white mates.
    pub fn mate_in(&self) -> Option<i32> {
        self.score.and_then(|s| s.mate_in())
    }
}

/// Run one direct search on `position` itself and summarize it.
///
/// This is deliberately a second, cheap call rather than a projection of
/// the ranked per-move results: the top-ranked post-move evaluation does
/// not carry the pre-move principal variation.
///
/// # Errors
///
/// `AnalysisFailed` when the engine produces neither a score nor a
/// variation. Unlike the per-move path, a best-move response without a
/// best move is useless to the caller.
pub fn summarize<S: Analyze + ?Sized>(
    session: &S,
    position: &Chess,
    limit: &SearchLimit,
) -> Result<BestMoveSummary, AnalysisError> {
    let mover = position.turn();
    let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();

    let result = session.analyze(&fen, limit)?;
    let score = WhiteScore::from_engine(&result, mover);

    let best_move = result
        .pv
        .first()
        .cloned()
        .or_else(|| result.best_move.clone());
    let mut pv = result.pv;
    pv.truncate(PV_PLIES);

    Ok(BestMoveSummary {
        best_move,
        score,
        depth: result.depth,
        nodes: result.nodes,
        pv,
    })
}
