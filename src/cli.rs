//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ExecutionMode, HarnessConfig, LogFormat};
use crate::Result;

/// Command-line arguments for the lockbench binary.
#[derive(Debug, Parser)]
#[command(name = "lockbench", version, about = "Global-lock vs free-threaded workload benchmarks")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LOCKBENCH_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Execution mode to measure under (global-lock or free-threaded).
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<ExecutionMode>,

    /// Directory scratch files are created in.
    #[arg(long = "scratch-dir", value_name = "PATH")]
    pub scratch_dir: Option<PathBuf>,

    /// Append every timing sample to the results history.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub record: bool,

    /// Default log level (RUST_LOG takes precedence).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long = "log-json", action = clap::ArgAction::SetTrue)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Report whether a global execution lock is active.
    Probe,
    /// Time the single-threaded summation loop.
    Sum(SumArgs),
    /// Count primes sequentially and on the worker pool.
    Cpu(CpuArgs),
    /// Run write/read cycles sequentially and on the worker pool.
    Io(IoArgs),
    /// Run every workload.
    All,
    /// Serve the HTTP endpoints.
    Serve(ServeArgs),
    /// Show or clear recorded samples.
    History(HistoryArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct SumArgs {
    #[arg(long)]
    pub iterations: Option<u64>,
    #[arg(long)]
    pub repeats: Option<u32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CpuArgs {
    /// Exclusive upper bound of the counted range.
    #[arg(long)]
    pub upper: Option<u64>,
    #[arg(long = "chunk-size")]
    pub chunk_size: Option<u64>,
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct IoArgs {
    #[arg(long = "file-mb")]
    pub file_mb: Option<u64>,
    #[arg(long = "chunk-kb")]
    pub chunk_kb: Option<u64>,
    /// Invocations per run.
    #[arg(long)]
    pub operations: Option<usize>,
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    /// Listen address, e.g. 0.0.0.0:8000.
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Number of recent samples to show.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
    /// Delete the history instead of showing it.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub clear: bool,
}

fn parse_mode(value: &str) -> std::result::Result<ExecutionMode, String> {
    value.parse().map_err(|e: crate::LockBenchError| e.to_string())
}

impl CliArgs {
    /// Load the file configuration and apply command-line overrides
    pub fn resolve_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config_file {
            Some(path) => HarnessConfig::load_from(path)?,
            None => HarnessConfig::load()?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(dir) = &self.scratch_dir {
            config.scratch_dir = dir.clone();
        }
        if self.record {
            config.record = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.log_json {
            config.logging.format = LogFormat::Json;
        }

        match &self.command {
            Command::Sum(args) => {
                override_with(&mut config.summation.iterations, args.iterations);
                override_with(&mut config.summation.repeats, args.repeats);
            }
            Command::Cpu(args) => {
                override_with(&mut config.cpu.upper, args.upper);
                override_with(&mut config.cpu.chunk_size, args.chunk_size);
                override_with(&mut config.cpu.workers, args.workers);
            }
            Command::Io(args) => {
                override_with(&mut config.io.file_mb, args.file_mb);
                override_with(&mut config.io.chunk_kb, args.chunk_kb);
                override_with(&mut config.io.operations, args.operations);
                override_with(&mut config.io.workers, args.workers);
            }
            Command::Serve(args) => {
                if let Some(bind) = &args.bind {
                    config.http.bind = bind.clone();
                }
            }
            Command::Probe | Command::All | Command::History(_) => {}
        }
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
