//! Server configuration loading.
//!
//! Configuration comes from `analysis.toml` in the working directory;
//! every field has a default so the file is optional.

use engine_analysis::ServiceOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main server configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind the HTTP listener to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Candidate engine executables, checked in order at startup.
    /// A bare name (no path separator) is resolved through `PATH`.
    #[serde(default = "default_engine_paths")]
    pub engine_paths: Vec<String>,
    /// Origins allowed by CORS. An empty list allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Analysis options passed through to the evaluation core.
    #[serde(default)]
    pub analysis: ServiceOptions,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_engine_paths() -> Vec<String> {
    vec![
        "./stockfish".to_string(),
        "/usr/local/bin/stockfish".to_string(),
        "/usr/bin/stockfish".to_string(),
        "stockfish".to_string(),
    ]
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:3001".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            engine_paths: default_engine_paths(),
            cors_origins: default_cors_origins(),
            analysis: ServiceOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the server configuration from disk.
    ///
    /// If the file at [`Self::config_path()`] does not exist, returns the
    /// default configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file exists but cannot be read,
    /// [`ConfigError::Parse`] if it contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        PathBuf::from("analysis.toml")
    }

    /// Locate the engine executable: the first candidate that exists on
    /// disk, or the first bare name assumed resolvable through `PATH`.
    ///
    /// Spawning still verifies the result; this only picks the candidate.
    pub fn find_engine(&self) -> Option<String> {
        self.engine_paths
            .iter()
            .find(|candidate| {
                Path::new(candidate).exists()
                    || !candidate.contains(std::path::MAIN_SEPARATOR)
            })
            .cloned()
    }

    /// The address string the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
