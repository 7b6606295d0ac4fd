//! Service-level error taxonomy.

use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// `InvalidInput` is client-caused and terminal for the request.
/// `EngineUnavailable` is fatal at startup and a server error afterwards.
/// `AnalysisFailed` is a server error for single-position queries; inside a
/// full-board enumeration it degrades to a null-filled per-move record
/// instead of aborting the batch.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed position record, bad turn token, or unparseable FEN.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Engine executable missing, handshake failed, or session not started.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
    /// The engine died mid-search or returned no usable result.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}
