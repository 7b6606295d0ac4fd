//! UCI engine process wrapper.
//!
//! One [`UciEngine`] owns one spawned engine process and runs one blocking
//! search per [`search`](SearchEngine::search) call. Serialization of
//! concurrent callers is the job of [`crate::session::EngineSession`]; this
//! module only speaks the protocol.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Maximum number of lines to read before giving up on a UCI response.
///
/// A long `movetime` search emits one info line per iteration plus periodic
/// `currmove` chatter, so this is sized well above anything a bounded search
/// produces.
pub const MAX_UCI_LINES: usize = 100_000;

/// Errors that can occur when talking to an engine process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// I/O failure on the engine's pipes or while spawning/reaping it.
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Engine executable could not be located.
    #[error("Engine not found: {0}")]
    NotFound(String),
    /// Engine failed the UCI handshake.
    #[error("Engine initialization failed")]
    InitFailed,
    /// Engine returned an invalid or unexpected response.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
}

/// Search bound for a single engine invocation.
///
/// Exactly one bound is active per search; the service layer picks depth
/// over time when both are configured.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchLimit {
    /// Elapsed-time budget in seconds.
    MoveTime(f64),
    /// Fixed search depth in plies.
    Depth(u32),
}

impl SearchLimit {
    /// The UCI `go` command enforcing this limit.
    fn go_command(&self) -> String {
        match self {
            SearchLimit::MoveTime(seconds) => {
                let millis = (seconds * 1000.0).round().max(1.0) as u64;
                format!("go movetime {millis}")
            }
            SearchLimit::Depth(depth) => format!("go depth {depth}"),
        }
    }
}

/// Raw outcome of one engine search.
///
/// Scores are relative to the side to move of the searched position, per
/// UCI convention; [`crate::score::WhiteScore`] converts them to an
/// absolute frame exactly once.
#[derive(Debug, Clone, Default)]
pub struct EngineResult {
    /// Search depth reached.
    pub depth: Option<u32>,
    /// Centipawn score relative to the side to move.
    pub score_cp: Option<i32>,
    /// Mate distance in plies relative to the side to move.
    pub score_mate: Option<i32>,
    /// Number of nodes searched.
    pub nodes: Option<u64>,
    /// Move reported by the `bestmove` line; `None` for `bestmove (none)`.
    pub best_move: Option<String>,
    /// Principal variation, best line first.
    pub pv: Vec<String>,
}

impl EngineResult {
    /// Whether the engine produced anything a caller can act on.
    ///
    /// A result with neither a score nor a principal variation is useless
    /// and is reported as a failed analysis by the session.
    pub fn is_usable(&self) -> bool {
        self.score_cp.is_some() || self.score_mate.is_some() || !self.pv.is_empty()
    }

    /// Merge one `info` line into this result.
    ///
    /// Later lines overwrite earlier ones, so the result converges on the
    /// deepest iteration the engine reported. Discovering a mate clears a
    /// stale centipawn score and vice versa.
    fn apply_info_line(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mut i = 0;
        while i < parts.len() {
            match parts[i] {
                "depth" => {
                    if let Some(d) = parts.get(i + 1).and_then(|s| s.parse().ok()) {
                        self.depth = Some(d);
                    }
                    i += 1;
                }
                "score" => match (parts.get(i + 1), parts.get(i + 2)) {
                    (Some(&"cp"), Some(value)) => {
                        self.score_cp = value.parse().ok();
                        self.score_mate = None;
                        i += 2;
                    }
                    (Some(&"mate"), Some(value)) => {
                        self.score_mate = value.parse().ok();
                        self.score_cp = None;
                        i += 2;
                    }
                    _ => {}
                },
                "nodes" => {
                    if let Some(n) = parts.get(i + 1).and_then(|s| s.parse().ok()) {
                        self.nodes = Some(n);
                    }
                    i += 1;
                }
                "pv" => {
                    self.pv = parts[i + 1..].iter().map(|s| (*s).to_string()).collect();
                    return;
                }
                _ => {}
            }
            i += 1;
        }
    }
}

/// Search backend driven by a session.
///
/// Implemented by [`UciEngine`]; tests substitute a scripted fake to
/// exercise the orchestration without a real process.
pub trait SearchEngine: Send {
    /// Run one search over the position given in FEN under `limit`.
    fn search(&mut self, fen: &str, limit: &SearchLimit) -> Result<EngineResult, EngineError>;

    /// Request graceful termination of the backend.
    fn quit(&mut self) -> Result<(), EngineError>;
}

/// Wrapper for UCI-compatible engines like Stockfish.
///
/// Spawning performs the full UCI handshake, so a constructed value is
/// ready to search.
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// The engine's name as reported via `id name`.
    name: String,
}

impl UciEngine {
    /// Spawn the engine at `engine_path` and perform the UCI handshake.
    ///
    /// The path may be a bare executable name resolved through `PATH`.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotFound` if the executable cannot be located
    /// - `EngineError::Io` if the process fails to start for any other reason
    /// - `EngineError::InitFailed` if the UCI handshake fails
    pub fn new(engine_path: &str) -> Result<Self, EngineError> {
        let mut process = Command::new(engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::NotFound(engine_path.to_string()),
                _ => EngineError::Io(e),
            })?;

        let stdin = process.stdin.take().ok_or(EngineError::InitFailed)?;
        let stdout = process.stdout.take().ok_or(EngineError::InitFailed)?;
        let stdout = BufReader::new(stdout);

        let mut engine = Self {
            process,
            stdin,
            stdout,
            name: String::new(),
        };

        engine.init_uci()?;

        Ok(engine)
    }

    /// Initialize the UCI protocol with the engine.
    fn init_uci(&mut self) -> Result<(), EngineError> {
        // Send "uci" and wait for "uciok", capturing the engine name.
        self.send_command("uci")?;

        let mut name = String::new();
        let mut lines_read = 0;
        loop {
            if lines_read > MAX_UCI_LINES {
                return Err(EngineError::InitFailed);
            }
            lines_read += 1;
            let line = self.read_line()?;
            if let Some(id) = line.strip_prefix("id name ") {
                name = id.to_string();
            } else if line == "uciok" {
                break;
            }
        }

        self.name = if name.is_empty() {
            "Unknown Engine".to_string()
        } else {
            name
        };

        // Send "isready" and wait for "readyok".
        self.send_command("isready")?;
        let mut lines_read = 0;
        loop {
            if lines_read > MAX_UCI_LINES {
                return Err(EngineError::InitFailed);
            }
            lines_read += 1;
            let line = self.read_line()?;
            if line == "readyok" {
                break;
            }
        }

        Ok(())
    }

    /// Returns the engine's name as reported during the handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a command to the engine.
    fn send_command(&mut self, command: &str) -> Result<(), EngineError> {
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Read a line from the engine's output.
    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let bytes = self.stdout.read_line(&mut line)?;
        if bytes == 0 {
            return Err(EngineError::InvalidResponse(
                "Engine closed unexpectedly".to_string(),
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl SearchEngine for UciEngine {
    fn search(&mut self, fen: &str, limit: &SearchLimit) -> Result<EngineResult, EngineError> {
        self.send_command(&format!("position fen {fen}"))?;
        self.send_command(&limit.go_command())?;

        let mut result = EngineResult::default();
        let mut lines_read = 0;
        loop {
            if lines_read > MAX_UCI_LINES {
                return Err(EngineError::InvalidResponse(
                    "Too many lines without bestmove".to_string(),
                ));
            }
            lines_read += 1;
            let line = self.read_line()?;

            if line.starts_with("info ")
                && !line.contains("upperbound")
                && !line.contains("lowerbound")
            {
                result.apply_info_line(&line);
            } else if let Some(rest) = line.strip_prefix("bestmove") {
                // "bestmove (none)" is what engines report on a finished
                // position (checkmate or stalemate).
                let mv = rest.split_whitespace().next().unwrap_or("");
                if !mv.is_empty() && mv != "(none)" {
                    result.best_move = Some(mv.to_string());
                }
                break;
            }
        }

        Ok(result)
    }

    fn quit(&mut self) -> Result<(), EngineError> {
        self.send_command("quit")?;
        self.process.wait()?;
        Ok(())
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best effort: ask the engine to exit and reap it.
        let _ = self.send_command("quit");
        let _ = self.process.wait();
    }
}
