//! Position record parsing.
//!
//! Requests carry positions as `"<turn>::<fen>::<arrows>"`. The trailing
//! arrows segment is client-side annotation state and is ignored here; it
//! is kept verbatim so callers can round-trip it.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color};

use crate::error::AnalysisError;

/// Parsed position record.
#[derive(Debug, Clone)]
pub struct StateRecord {
    /// Turn token from the record. Informational: the FEN governs whose
    /// move it actually is.
    pub turn: Color,
    /// Position in FEN notation.
    pub fen: String,
    /// Opaque trailing annotation segment, empty when absent.
    pub arrows: String,
}

impl StateRecord {
    /// Parse a `"<turn>::<fen>::<arrows>"` record.
    ///
    /// The FEN is validated eagerly so a bad record fails before any engine
    /// work is done.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for fewer than two segments, an unknown turn token,
    /// or a FEN the rules library rejects.
    pub fn parse(record: &str) -> Result<Self, AnalysisError> {
        let parts: Vec<&str> = record.split("::").collect();
        if parts.len() < 2 {
            return Err(AnalysisError::InvalidInput(
                "state record must contain at least turn and FEN separated by ::".to_string(),
            ));
        }

        let turn = match parts[0].trim() {
            "white" => Color::White,
            "black" => Color::Black,
            other => {
                return Err(AnalysisError::InvalidInput(format!(
                    "turn must be 'white' or 'black', got '{other}'"
                )))
            }
        };

        let fen = parts[1].trim().to_string();
        let arrows = parts
            .get(2)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Self::position_from_fen(&fen)?;

        Ok(Self { turn, fen, arrows })
    }

    /// Build a fresh position from the record's FEN.
    ///
    /// Every request gets its own instance; positions are never shared
    /// between concurrent evaluations.
    pub fn position(&self) -> Result<Chess, AnalysisError> {
        Self::position_from_fen(&self.fen)
    }

    fn position_from_fen(fen: &str) -> Result<Chess, AnalysisError> {
        let parsed = fen
            .parse::<Fen>()
            .map_err(|e| AnalysisError::InvalidInput(format!("invalid FEN '{fen}': {e}")))?;
        parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| AnalysisError::InvalidInput(format!("invalid FEN '{fen}': {e}")))
    }
}
