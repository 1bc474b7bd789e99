//! Benchmark engine module
//!
//! Workloads, the fixed-size worker pool they are submitted to, and the
//! harness that times them.

pub mod io_cycle;
pub mod primes;
pub mod runner;
pub mod summation;
pub mod worker;

pub use io_cycle::{CyclePhase, CycleReport, IoRunSummary};
pub use primes::{is_prime, partition, Partition, PartitionedCount};
pub use runner::Harness;
pub use worker::WorkerPool;
