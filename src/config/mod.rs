//! Configuration management module
//!
//! Handles loading, saving, and validation of the harness configuration.
//! Every workload entry point receives the section it needs explicitly.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LockBenchError, Result, APP_NAME, CONFIG_FILE};

pub mod persistence;

/// Execution mode the harness measures under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// One process-wide gate serializes compute sections
    #[default]
    GlobalLock,
    /// No gate; compute sections run in parallel
    FreeThreaded,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::GlobalLock => "global-lock",
            ExecutionMode::FreeThreaded => "free-threaded",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = LockBenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global-lock" | "gil" => Ok(ExecutionMode::GlobalLock),
            "free-threaded" | "nogil" => Ok(ExecutionMode::FreeThreaded),
            other => Err(LockBenchError::Config(format!("unknown execution mode: {}", other))),
        }
    }
}

/// Prime-counting workload parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CpuConfig {
    /// Exclusive upper bound of the counted range `[2, upper)`
    pub upper: u64,
    /// Size of each partition submitted to the pool
    pub chunk_size: u64,
    /// Worker pool size
    pub workers: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            upper: 2_000_000,
            chunk_size: 50_000,
            workers: 8,
        }
    }
}

/// Write/read cycle parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IoConfig {
    /// Size of each scratch file in MiB
    pub file_mb: u64,
    /// Chunk size for writes and reads in KiB
    pub chunk_kb: u64,
    /// Number of invocations per run
    pub operations: usize,
    /// Worker pool size for the pooled run
    pub workers: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            file_mb: 24,
            chunk_kb: 64,
            operations: 8,
            workers: 8,
        }
    }
}

impl IoConfig {
    /// File size in bytes; saturates for sizes `validate` rejects
    pub fn file_bytes(&self) -> u64 {
        self.file_mb.saturating_mul(1024 * 1024)
    }

    /// Chunk size in bytes; saturates for sizes `validate` rejects
    pub fn chunk_bytes(&self) -> u64 {
        self.chunk_kb.saturating_mul(1024)
    }
}

/// Single-threaded summation parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummationConfig {
    /// Terms summed per repeat
    pub iterations: u64,
    /// Number of repeats
    pub repeats: u32,
}

impl Default for SummationConfig {
    fn default() -> Self {
        Self {
            iterations: 100_000_000,
            repeats: 1,
        }
    }
}

/// Web endpoint harness parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address
    pub bind: String,
    /// Upper bound for the prime count behind `GET /cpu`
    pub cpu_upper: u64,
    /// Write/read cycles behind `GET /io`
    pub io_cycles: usize,
    /// Scratch file size for `GET /io` in MiB
    pub io_file_mb: u64,
    /// Chunk size for `GET /io` in KiB
    pub io_chunk_kb: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            cpu_upper: 100_000,
            io_cycles: 3,
            io_file_mb: 1,
            io_chunk_kb: 64,
        }
    }
}

impl HttpConfig {
    /// The I/O parameters for one `GET /io` request
    pub fn io_config(&self) -> IoConfig {
        IoConfig {
            file_mb: self.io_file_mb,
            chunk_kb: self.io_chunk_kb,
            operations: self.io_cycles,
            workers: 1,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Execution mode to measure under
    pub mode: ExecutionMode,
    /// Directory scratch files are created in
    pub scratch_dir: PathBuf,
    /// Append every timing sample to the results history
    pub record: bool,
    pub cpu: CpuConfig,
    pub io: IoConfig,
    pub summation: SummationConfig,
    pub http: HttpConfig,
    pub logging: LoggingSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            scratch_dir: std::env::temp_dir(),
            record: false,
            cpu: CpuConfig::default(),
            io: IoConfig::default(),
            summation: SummationConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.scratch_dir.is_dir() {
            return Err(LockBenchError::Config(format!(
                "Scratch directory is not a directory: {}",
                self.scratch_dir.display()
            )));
        }

        self.cpu.validate()?;
        self.io.validate()?;

        if self.summation.repeats == 0 {
            return Err(LockBenchError::Config(
                "Summation repeats must be greater than 0".to_string(),
            ));
        }

        let http_io = self.http.io_config();
        http_io.validate()?;
        if self.http.bind.trim().is_empty() {
            return Err(LockBenchError::Config("Bind address must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn with_cpu(mut self, upper: u64, chunk_size: u64, workers: usize) -> Self {
        self.cpu = CpuConfig {
            upper,
            chunk_size,
            workers,
        };
        self
    }

    pub fn with_io(
        mut self,
        file_mb: u64,
        chunk_kb: u64,
        operations: usize,
        workers: usize,
    ) -> Self {
        self.io = IoConfig {
            file_mb,
            chunk_kb,
            operations,
            workers,
        };
        self
    }

    pub fn with_summation(mut self, iterations: u64, repeats: u32) -> Self {
        self.summation = SummationConfig { iterations, repeats };
        self
    }


    /// Load configuration from the standard config file location.
    /// Returns the default configuration if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LockBenchError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            LockBenchError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockBenchError::Config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            LockBenchError::Config(format!("Failed to write config file {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Standard configuration file path: `$CONFIG_HOME/lockbench/lockbench.toml`
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            LockBenchError::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

impl CpuConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(LockBenchError::Config("Chunk size must be greater than 0".to_string()));
        }
        validate_workers(self.workers)
    }
}

impl IoConfig {
    pub fn validate(&self) -> Result<()> {
        if self.file_mb == 0 {
            return Err(LockBenchError::Config("File size must be greater than 0".to_string()));
        }
        if self.chunk_kb == 0 {
            return Err(LockBenchError::Config("Chunk size must be greater than 0".to_string()));
        }
        let file_bytes = self
            .file_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| LockBenchError::Config("File size too large".to_string()))?;
        let chunk_bytes = self
            .chunk_kb
            .checked_mul(1024)
            .filter(|&bytes| usize::try_from(bytes).is_ok())
            .ok_or_else(|| LockBenchError::Config("Chunk size too large".to_string()))?;
        if chunk_bytes > file_bytes {
            return Err(LockBenchError::Config(
                "Chunk size must not exceed the file size".to_string(),
            ));
        }
        if self.operations == 0 {
            return Err(LockBenchError::Config(
                "Operation count must be greater than 0".to_string(),
            ));
        }
        validate_workers(self.workers)
    }
}

fn validate_workers(workers: usize) -> Result<()> {
    const MAX_WORKERS: usize = 256;
    if workers == 0 {
        return Err(LockBenchError::Config("Worker count must be greater than 0".to_string()));
    }
    if workers > MAX_WORKERS {
        return Err(LockBenchError::Config(format!(
            "Too many workers: {} (max: {})",
            workers, MAX_WORKERS
        )));
    }
    Ok(())
}
