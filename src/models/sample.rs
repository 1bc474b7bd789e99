//! Timing sample data model
//!
//! One sample is produced per measured run: which workload ran, under which
//! execution mode, how long it took, and the workload's correctness payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::ExecutionMode;
use crate::util::units::{calculate_throughput_mbps, format_bytes, format_elapsed};

/// Workloads the harness can measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    Summation,
    CpuSequential,
    CpuPartitioned,
    IoSequential,
    IoPooled,
}

impl WorkloadKind {
    pub fn description(&self) -> &'static str {
        match self {
            WorkloadKind::Summation => "single-threaded summation",
            WorkloadKind::CpuSequential => "prime count (sequential)",
            WorkloadKind::CpuPartitioned => "prime count (partitioned)",
            WorkloadKind::IoSequential => "write/read cycle (sequential)",
            WorkloadKind::IoPooled => "write/read cycle (pooled)",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Correctness payload of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    Sum { value: u64 },
    Primes { count: u64, partitions: usize },
    Io { operations: usize, bytes_written: u64, bytes_read: u64 },
}

/// A single measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSample {
    pub timestamp: DateTime<Utc>,
    pub workload: WorkloadKind,
    pub mode: ExecutionMode,
    /// Workers the run was submitted to (1 for sequential runs)
    pub workers: usize,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    pub outcome: Outcome,
    pub system_info: SystemInfo,
}

/// Host information captured with each sample
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemInfo {
    /// Operating system and architecture
    pub os: String,
    /// Logical CPUs available to the process
    pub cpus: usize,
}

impl TimingSample {
    pub fn new(
        workload: WorkloadKind,
        mode: ExecutionMode,
        workers: usize,
        elapsed: Duration,
        outcome: Outcome,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            workload,
            mode,
            workers,
            elapsed,
            outcome,
            system_info: SystemInfo::detect(),
        }
    }

    /// One-line human-readable report
    pub fn summary(&self) -> String {
        let detail = match &self.outcome {
            Outcome::Sum { value } => format!("sum={}", value),
            Outcome::Primes { count, partitions } => {
                format!("primes={} partitions={}", count, partitions)
            }
            Outcome::Io {
                operations,
                bytes_written,
                bytes_read,
            } => format!(
                "ops={} written={} read={} ({:.1} MB/s)",
                operations,
                format_bytes(*bytes_written),
                format_bytes(*bytes_read),
                calculate_throughput_mbps(bytes_written + bytes_read, self.elapsed)
            ),
        };

        format!(
            "[{}] {} x{}: {} - {}",
            self.mode,
            self.workload,
            self.workers,
            format_elapsed(self.elapsed),
            detail
        )
    }
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            os: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
