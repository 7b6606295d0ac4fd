//! Conversion of mover-relative engine scores into a white-perspective frame.
//!
//! UCI engines report scores relative to the side to move of the searched
//! position. Getting the flip wrong is the classic bug in move-enumeration
//! code, so the conversion lives here as one pure function and nowhere else.

use shakmaty::Color;

use crate::engine::EngineResult;

/// Absolute position score from white's point of view.
///
/// Mates carry the winning color explicitly: a signed ply count cannot
/// represent "mate in zero" (the searched position is already decided), but
/// ranking still needs to know which side won it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WhiteScore {
    /// Advantage in pawns; positive favors white.
    Pawns(f64),
    /// Forced mate in `plies` by `winner`.
    MateIn { plies: u32, winner: Color },
}

impl WhiteScore {
    /// Normalize a raw engine result against the side to move of the
    /// position that produced it.
    ///
    /// A mate score takes precedence over a centipawn score. Returns `None`
    /// when the engine reported neither; the caller decides whether that is
    /// a failed analysis or a degraded per-move record.
    pub fn from_engine(result: &EngineResult, mover: Color) -> Option<Self> {
        if let Some(mate) = result.score_mate {
            // mate > 0: the mover delivers mate; mate <= 0: the mover is
            // being mated (0 means mated in the searched position itself).
            let winner = if mate > 0 { mover } else { !mover };
            Some(WhiteScore::MateIn {
                plies: mate.unsigned_abs(),
                winner,
            })
        } else if let Some(cp) = result.score_cp {
            let signed = match mover {
                Color::White => cp,
                Color::Black => -cp,
            };
            Some(WhiteScore::Pawns(f64::from(signed) / 100.0))
        } else {
            None
        }
    }

    /// White's advantage in pawns; `None` exactly when the line is forced mate.
    pub fn advantage(&self) -> Option<f64> {
        match self {
            WhiteScore::Pawns(pawns) => Some(*pawns),
            WhiteScore::MateIn { .. } => None,
        }
    }

    /// Whether this score is a forced mate.
    pub fn is_mate(&self) -> bool {
        matches!(self, WhiteScore::MateIn { .. })
    }

    /// Signed mate distance: positive means white mates, negative means
    /// white is being mated.
    pub fn mate_in(&self) -> Option<i32> {
        match self {
            WhiteScore::Pawns(_) => None,
            WhiteScore::MateIn { plies, winner } => {
                let plies = *plies as i32;
                Some(match winner {
                    Color::White => plies,
                    Color::Black => -plies,
                })
            }
        }
    }
}
