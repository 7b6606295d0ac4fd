//! Engine session lifecycle and request serialization.
//!
//! One [`EngineSession`] owns the single engine process backing the whole
//! service. The external process has no notion of concurrent requests, so
//! the session is the one place where callers serialize: `analyze` holds an
//! exclusive lock for the full command/response span of a search.

use std::sync::{Mutex, MutexGuard, TryLockError};

use crate::engine::{EngineResult, SearchEngine, SearchLimit, UciEngine};
use crate::error::AnalysisError;

/// Interface the evaluation pipeline needs from an engine session.
///
/// Letting the evaluator and service depend on this seam instead of the
/// concrete session keeps the single-engine constraint substitutable in
/// tests.
pub trait Analyze: Send + Sync {
    /// Run one search over the position given in FEN under `limit`,
    /// blocking until the engine reports its result.
    fn analyze(&self, fen: &str, limit: &SearchLimit) -> Result<EngineResult, AnalysisError>;
}

/// Owner of one engine process for the lifetime of the service.
///
/// Created once at startup, stopped once at shutdown, never recreated
/// mid-request. `start` and `stop` are idempotent; `analyze` calls from
/// concurrent requests block until the in-flight search completes. There is
/// no queuing priority and no cancellation of a running search.
pub struct EngineSession<E: SearchEngine = UciEngine> {
    engine: Mutex<Option<E>>,
    path: String,
}

impl EngineSession<UciEngine> {
    /// Create a session for the engine at `path` without touching the
    /// process; call [`start`](Self::start) to launch it.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            engine: Mutex::new(None),
            path: path.into(),
        }
    }

    /// Launch the engine process and perform its handshake.
    ///
    /// No-op when the session is already started.
    ///
    /// # Errors
    ///
    /// `EngineUnavailable` if the executable cannot be located or the
    /// handshake fails.
    pub fn start(&self) -> Result<(), AnalysisError> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Ok(());
        }
        let engine = UciEngine::new(&self.path)
            .map_err(|e| AnalysisError::EngineUnavailable(e.to_string()))?;
        tracing::info!("Engine session started: {} ({})", engine.name(), self.path);
        *guard = Some(engine);
        Ok(())
    }
}

impl<E: SearchEngine> EngineSession<E> {
    /// Wrap an already-running backend, yielding a started session.
    ///
    /// Used by tests to drive the orchestration with a fake engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine: Mutex::new(Some(engine)),
            path: String::new(),
        }
    }

    /// Request graceful termination of the engine.
    ///
    /// Failures are logged, not raised: shutdown must not crash the caller.
    /// No-op when the session is not started.
    pub fn stop(&self) {
        let mut guard = self.lock();
        if let Some(mut engine) = guard.take() {
            if let Err(e) = engine.quit() {
                tracing::warn!("Error stopping engine: {}", e);
            } else {
                tracing::info!("Engine session stopped");
            }
        }
    }

    /// Non-blocking liveness probe.
    ///
    /// A contended lock means a search is in flight, which is itself proof
    /// of a live session.
    pub fn is_ready(&self) -> bool {
        match self.engine.try_lock() {
            Ok(guard) => guard.is_some(),
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
        }
    }

    /// Path of the engine executable this session manages.
    pub fn engine_path(&self) -> &str {
        &self.path
    }

    /// Acquire the engine handle, recovering it if a previous holder
    /// panicked.
    fn lock(&self) -> MutexGuard<'_, Option<E>> {
        self.engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E: SearchEngine> Analyze for EngineSession<E> {
    fn analyze(&self, fen: &str, limit: &SearchLimit) -> Result<EngineResult, AnalysisError> {
        let mut guard = self.lock();
        let engine = guard.as_mut().ok_or_else(|| {
            AnalysisError::EngineUnavailable("engine session not started".to_string())
        })?;

        let result = engine
            .search(fen, limit)
            .map_err(|e| AnalysisError::AnalysisFailed(e.to_string()))?;
        if !result.is_usable() {
            return Err(AnalysisError::AnalysisFailed(format!(
                "engine returned no score and no variation for {fen}"
            )));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cp_result, FakeEngine};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_start_fails_for_missing_executable() {
        let session = EngineSession::new("/nonexistent/path/to/stockfish");
        let result = session.start();
        assert!(matches!(result, Err(AnalysisError::EngineUnavailable(_))));
        assert!(!session.is_ready());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let session = EngineSession::new("stockfish");
        session.stop();
        session.stop();
        assert!(!session.is_ready());
    }

    #[test]
    fn test_analyze_before_start_is_unavailable() {
        let session = EngineSession::new("stockfish");
        let result = session.analyze("8/8/8/8/8/8/8/8 w - - 0 1", &SearchLimit::Depth(1));
        assert!(matches!(result, Err(AnalysisError::EngineUnavailable(_))));
    }

    #[test]
    fn test_with_engine_is_ready_and_analyzes() {
        let session = EngineSession::with_engine(FakeEngine::returning(cp_result(25, &["e7e5"])));
        assert!(session.is_ready());

        let result = session
            .analyze("fen", &SearchLimit::MoveTime(1.0))
            .expect("analyze should succeed");
        assert_eq!(result.score_cp, Some(25));
    }

    #[test]
    fn test_unusable_result_is_analysis_failed() {
        let session = EngineSession::with_engine(FakeEngine::returning(EngineResult::default()));
        let result = session.analyze("fen", &SearchLimit::Depth(5));
        assert!(matches!(result, Err(AnalysisError::AnalysisFailed(_))));
    }

    #[test]
    fn test_stop_makes_session_unready_and_is_idempotent() {
        let session = EngineSession::with_engine(FakeEngine::returning(cp_result(0, &[])));
        assert!(session.is_ready());
        session.stop();
        assert!(!session.is_ready());
        session.stop();

        let result = session.analyze("fen", &SearchLimit::Depth(1));
        assert!(matches!(result, Err(AnalysisError::EngineUnavailable(_))));
    }

    #[test]
    fn test_concurrent_analyze_calls_never_overlap() {
        let engine = FakeEngine::returning(cp_result(10, &["e2e4"])).with_delay(5);
        let overlapped = engine.overlapped.clone();
        let session = Arc::new(EngineSession::with_engine(engine));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let session = Arc::clone(&session);
            handles.push(thread::spawn(move || {
                for _ in 0..5 {
                    session
                        .analyze("fen", &SearchLimit::MoveTime(0.5))
                        .expect("analyze should succeed");
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        assert!(
            !overlapped.load(std::sync::atomic::Ordering::SeqCst),
            "two searches were in flight at once"
        );
    }

    #[test]
    fn test_is_ready_while_search_in_flight() {
        let engine = FakeEngine::returning(cp_result(0, &[])).with_delay(50);
        let session = Arc::new(EngineSession::with_engine(engine));

        let worker = {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                session
                    .analyze("fen", &SearchLimit::MoveTime(0.5))
                    .expect("analyze should succeed");
            })
        };
        // Give the worker a moment to take the lock.
        thread::sleep(Duration::from_millis(10));
        assert!(session.is_ready());
        worker.join().expect("worker thread panicked");
    }
}
