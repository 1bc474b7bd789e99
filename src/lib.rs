//! lockbench - thread-scaling benchmark harness
//!
//! Measures CPU-bound and I/O-bound workloads on a fixed-size worker pool
//! under two execution modes: a single global execution gate, or none.

use thiserror::Error;

pub mod bench;
pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod probe;
pub mod server;
pub mod telemetry;
pub mod util;

/// Errors produced by the harness
#[derive(Debug, Error)]
pub enum LockBenchError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    Config(String),
    /// Workload execution error
    #[error("Benchmark error: {0}")]
    Benchmark(String),
    /// Scratch file creation or removal failed
    #[error("Temporary file error: {0}")]
    TempFile(String),
    /// Data read back differs from data written
    #[error("Read-back mismatch in chunk {chunk} at offset {offset}")]
    DataMismatch { chunk: u64, offset: u64 },
    /// Results persistence error
    #[error("Results persistence error: {0}")]
    Persistence(String),
    /// Worker pool construction or join error
    #[error("Worker error: {0}")]
    Worker(String),
    /// HTTP harness error
    #[error("Server error: {0}")]
    Server(String),
    /// Tracing subscriber installation failed
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl From<serde_json::Error> for LockBenchError {
    fn from(err: serde_json::Error) -> Self {
        LockBenchError::Persistence(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for LockBenchError {
    fn from(err: toml::de::Error) -> Self {
        LockBenchError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for LockBenchError {
    fn from(err: toml::ser::Error) -> Self {
        LockBenchError::Config(format!("TOML serialization error: {}", err))
    }
}

impl From<rayon::ThreadPoolBuildError> for LockBenchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        LockBenchError::Worker(format!("failed to build worker pool: {}", err))
    }
}

/// Result type alias for lockbench operations
pub type Result<T> = std::result::Result<T, LockBenchError>;

/// Error reporting helpers for the command line
pub mod error {
    use super::LockBenchError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &LockBenchError) -> String {
        match error {
            LockBenchError::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                "Permission denied. Choose a scratch directory you can write to.".to_string()
            }
            LockBenchError::TempFile(_) => {
                "Failed to create scratch files. Check disk space and permissions.".to_string()
            }
            LockBenchError::Config(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            LockBenchError::DataMismatch { .. } => {
                format!("{}. The storage returned different bytes than were written.", error)
            }
            LockBenchError::Persistence(_) => {
                "Failed to record results. Check disk space and permissions.".to_string()
            }
            _ => error.to_string(),
        }
    }
}

pub const APP_NAME: &str = "lockbench";
pub const CONFIG_FILE: &str = "lockbench.toml";
pub const RESULTS_FILE: &str = "results.json";
pub const TEMP_FILE_PREFIX: &str = "LOCKBENCH_TMP_";
pub const MAX_RESULTS_HISTORY: usize = 100;
