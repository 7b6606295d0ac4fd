//! Chess position evaluation through an external UCI engine.
//!
//! Given a position and a time budget, this crate drives a single
//! long-lived engine process (Stockfish or any UCI engine) to produce
//! move-by-move evaluations, a best move, and a principal variation.
//!
//! # Overview
//!
//! - [`EngineSession`] - owner of the one engine process; serializes all
//!   searches behind it
//! - [`WhiteScore`] - mover-relative engine scores normalized to a
//!   white-perspective frame
//! - [`evaluate_all_moves`](evaluator::evaluate_all_moves) - sequential
//!   evaluation of every legal move
//! - [`rank`](rank::rank) / [`summarize`](rank::summarize) - move ranking
//!   and whole-position best-move summary
//! - [`AnalysisService`] - the façade composing all of the above
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use engine_analysis::{AnalysisService, EngineSession, ServiceOptions};
//!
//! let session = Arc::new(EngineSession::new("stockfish"));
//! session.start()?;
//! let service = AnalysisService::new(session, ServiceOptions::default());
//! let analysis = service.analyze_position("white::rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1::", None)?;
//! println!("best: {:?}", analysis.summary.best_move);
//! ```

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod rank;
pub mod record;
pub mod score;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{EngineResult, SearchEngine, SearchLimit, UciEngine};
pub use error::AnalysisError;
pub use evaluator::MoveEvaluation;
pub use rank::BestMoveSummary;
pub use record::StateRecord;
pub use score::WhiteScore;
pub use service::{AnalysisService, PositionAnalysis, ServiceOptions};
pub use session::{Analyze, EngineSession};
