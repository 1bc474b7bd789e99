//! Benchmark harness
//!
//! Times each workload and wraps the result in a [`TimingSample`] annotated
//! with the execution mode reported by the injected probe.

use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::bench::io_cycle::{self, IoRunSummary};
use crate::bench::primes;
use crate::bench::summation;
use crate::bench::worker::WorkerPool;
use crate::config::{ExecutionMode, HarnessConfig};
use crate::models::{Outcome, TimingSample, WorkloadKind};
use crate::probe::{ExecutionGate, LockProbe};
use crate::{LockBenchError, Result};

const PROGRESS_TEMPLATE: &str = "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}";

pub struct Harness {
    config: HarnessConfig,
    gate: Arc<ExecutionGate>,
    probe: Arc<dyn LockProbe>,
    show_progress: bool,
}

impl Harness {
    /// Build a harness whose gate follows `config.mode`; the gate doubles as the probe
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let gate = Arc::new(ExecutionGate::new(config.mode));
        let probe: Arc<dyn LockProbe> = gate.clone();

        Ok(Self {
            config,
            gate,
            probe,
            show_progress: false,
        })
    }

    /// Replace the probe used to annotate samples
    pub fn with_probe(mut self, probe: Arc<dyn LockProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn mode(&self) -> ExecutionMode {
        self.probe.mode()
    }

    pub fn gate(&self) -> Arc<ExecutionGate> {
        Arc::clone(&self.gate)
    }

    pub fn run_summation(&self) -> Result<TimingSample> {
        let start = Instant::now();
        let value = summation::run_summation(&self.config.summation, &self.gate);
        Ok(self.sample(WorkloadKind::Summation, 1, start, Outcome::Sum { value }))
    }

    pub fn run_cpu_sequential(&self) -> Result<TimingSample> {
        let start = Instant::now();
        let count = primes::count_sequential(self.config.cpu.upper, &self.gate);
        Ok(self.sample(
            WorkloadKind::CpuSequential,
            1,
            start,
            Outcome::Primes { count, partitions: 1 },
        ))
    }

    pub fn run_cpu_partitioned(&self) -> Result<TimingSample> {
        let cpu = &self.config.cpu;
        let units = primes::partition_count(cpu.upper, cpu.chunk_size)?;
        let pool = self.pool(cpu.workers, units, "partitions")?;

        let start = Instant::now();
        let result = primes::count_partitioned(cpu.upper, cpu.chunk_size, &pool)?;
        Ok(self.sample(
            WorkloadKind::CpuPartitioned,
            cpu.workers,
            start,
            Outcome::Primes {
                count: result.count,
                partitions: result.partitions,
            },
        ))
    }

    /// Sequential then partitioned count; the two counts must agree
    pub fn run_cpu(&self) -> Result<Vec<TimingSample>> {
        let sequential = self.run_cpu_sequential()?;
        let partitioned = self.run_cpu_partitioned()?;

        match (&sequential.outcome, &partitioned.outcome) {
            (Outcome::Primes { count: a, .. }, Outcome::Primes { count: b, .. }) if a == b => {
                Ok(vec![sequential, partitioned])
            }
            (a, b) => Err(LockBenchError::Benchmark(format!(
                "sequential and partitioned counts differ: {:?} vs {:?}",
                a, b
            ))),
        }
    }

    pub fn run_io_sequential(&self) -> Result<TimingSample> {
        let start = Instant::now();
        let summary =
            io_cycle::run_sequential(&self.config.scratch_dir, &self.config.io, &self.gate)?;
        Ok(self.sample(WorkloadKind::IoSequential, 1, start, io_outcome(summary)))
    }

    pub fn run_io_pooled(&self) -> Result<TimingSample> {
        let io = &self.config.io;
        let pool = self.pool(io.workers, io.operations as u64, "cycles")?;

        let start = Instant::now();
        let summary = io_cycle::run_pooled(&self.config.scratch_dir, io, &pool)?;
        Ok(self.sample(WorkloadKind::IoPooled, io.workers, start, io_outcome(summary)))
    }

    pub fn run_io(&self) -> Result<Vec<TimingSample>> {
        Ok(vec![self.run_io_sequential()?, self.run_io_pooled()?])
    }

    /// Every workload in a fixed order
    pub fn run_all(&self) -> Result<Vec<TimingSample>> {
        let mut samples = vec![self.run_summation()?];
        samples.extend(self.run_io()?);
        samples.extend(self.run_cpu()?);
        Ok(samples)
    }

    fn pool(&self, workers: usize, units: u64, label: &'static str) -> Result<WorkerPool> {
        let pool = WorkerPool::new(workers, self.gate())?;
        if !self.show_progress {
            return Ok(pool);
        }

        let bar = ProgressBar::new(units);
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE).unwrap_or_else(|err| {
            warn!(error = %err, "invalid progress template");
            ProgressStyle::default_bar()
        });
        bar.set_style(style);
        bar.set_message(label);
        Ok(pool.with_progress(bar))
    }

    fn sample(
        &self,
        workload: WorkloadKind,
        workers: usize,
        start: Instant,
        outcome: Outcome,
    ) -> TimingSample {
        let sample = TimingSample::new(workload, self.mode(), workers, start.elapsed(), outcome);
        info!(
            workload = ?sample.workload,
            mode = %sample.mode,
            workers,
            elapsed_ms = sample.elapsed.as_millis() as u64,
            "workload finished"
        );
        sample
    }
}

fn io_outcome(summary: IoRunSummary) -> Outcome {
    Outcome::Io {
        operations: summary.operations,
        bytes_written: summary.bytes_written,
        bytes_read: summary.bytes_read,
    }
}
