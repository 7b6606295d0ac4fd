//! Scripted engine fake shared by the crate's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::engine::{EngineError, EngineResult, SearchEngine, SearchLimit};

pub(crate) fn cp_result(cp: i32, pv: &[&str]) -> EngineResult {
    EngineResult {
        depth: Some(12),
        score_cp: Some(cp),
        score_mate: None,
        nodes: Some(4096),
        best_move: pv.first().map(|s| (*s).to_string()),
        pv: pv.iter().map(|s| (*s).to_string()).collect(),
    }
}

pub(crate) fn mate_result(mate: i32, pv: &[&str]) -> EngineResult {
    EngineResult {
        score_mate: Some(mate),
        ..cp_result(0, pv)
    }
}

/// In-process [`SearchEngine`] that replays a script, then a fallback.
///
/// Records every call it receives and raises `overlapped` if a second
/// search ever starts while one is still running, which is exactly what
/// the session lock must prevent.
pub(crate) struct FakeEngine {
    script: VecDeque<EngineResult>,
    fallback: EngineResult,
    pub calls: Arc<Mutex<Vec<(String, SearchLimit)>>>,
    pub overlapped: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    delay: Duration,
}

impl FakeEngine {
    pub fn returning(fallback: EngineResult) -> Self {
        Self {
            script: VecDeque::new(),
            fallback,
            calls: Arc::default(),
            overlapped: Arc::default(),
            in_flight: Arc::default(),
            delay: Duration::ZERO,
        }
    }

    pub fn scripted(script: Vec<EngineResult>, fallback: EngineResult) -> Self {
        Self {
            script: script.into(),
            ..Self::returning(fallback)
        }
    }

    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }
}

impl SearchEngine for FakeEngine {
    fn search(&mut self, fen: &str, limit: &SearchLimit) -> Result<EngineResult, EngineError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.calls
            .lock()
            .unwrap()
            .push((fen.to_string(), limit.clone()));
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn quit(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
