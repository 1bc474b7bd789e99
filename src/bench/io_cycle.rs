//! I/O-bound write/read cycle
//!
//! One invocation creates its own scratch file, writes the configured size in
//! fixed chunks with a flush and sync after every chunk, reads everything back
//! in the same chunk size while verifying it, and removes the file. Chunk
//! generation and verification run under the execution gate; the system calls
//! themselves do not.

use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::bench::worker::WorkerPool;
use crate::config::IoConfig;
use crate::io::{BufferPool, ScratchFile};
use crate::probe::ExecutionGate;
use crate::{LockBenchError, Result};

/// Pass an observer is notified from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Write,
    Read,
}

/// What one invocation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// File length after truncation, before the write pass
    pub preallocated_len: u64,
    pub chunks_written: u64,
    pub chunks_read: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
}

/// Reduction of many invocations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoRunSummary {
    pub operations: usize,
    pub chunks_written: u64,
    pub chunks_read: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
}

impl IoRunSummary {
    pub fn from_reports(reports: &[CycleReport]) -> Self {
        reports.iter().fold(
            Self::default(),
            |acc, report| Self {
                operations: acc.operations + 1,
                chunks_written: acc.chunks_written + report.chunks_written,
                chunks_read: acc.chunks_read + report.chunks_read,
                bytes_written: acc.bytes_written + report.bytes_written,
                bytes_read: acc.bytes_read + report.bytes_read,
            },
        )
    }
}

/// Run one invocation
pub fn run_cycle(
    scratch_dir: &Path,
    config: &IoConfig,
    buffers: &BufferPool,
    gate: &ExecutionGate,
) -> Result<CycleReport> {
    run_cycle_observed(scratch_dir, config, buffers, gate, |_, _| Ok(()))
}

/// Run one invocation, calling `observer` after every chunk. An observer
/// error aborts the invocation; the scratch file is removed either way.
pub fn run_cycle_observed<F>(
    scratch_dir: &Path,
    config: &IoConfig,
    buffers: &BufferPool,
    gate: &ExecutionGate,
    mut observer: F,
) -> Result<CycleReport>
where
    F: FnMut(CyclePhase, u64) -> Result<()>,
{
    let total = config.file_bytes();
    let chunk_size = config.chunk_bytes();
    if buffers.buffer_size() as u64 != chunk_size {
        return Err(LockBenchError::Config(format!(
            "Buffer size {} does not match chunk size {}",
            buffers.buffer_size(),
            chunk_size
        )));
    }

    let mut scratch = ScratchFile::create(scratch_dir, total)?;
    let mut report = CycleReport {
        preallocated_len: scratch.len()?,
        ..CycleReport::default()
    };

    let seed: u64 = rand::random();
    let mut expected = buffers.get()?;
    let mut actual = buffers.get()?;

    for (index, len) in chunk_lengths(total, chunk_size) {
        let chunk = &mut expected[..len];
        gate.enter(|| fill_chunk(seed, index, chunk));
        scratch.write_durable(chunk)?;
        report.chunks_written += 1;
        report.bytes_written += len as u64;
        observer(CyclePhase::Write, index)?;
    }

    scratch.rewind()?;

    for (index, len) in chunk_lengths(total, chunk_size) {
        let read_back = &mut actual[..len];
        scratch.read_chunk(read_back)?;
        let reference = &mut expected[..len];
        gate.enter(|| {
            fill_chunk(seed, index, reference);
            verify_chunk(index, chunk_size, reference, read_back)
        })?;
        report.chunks_read += 1;
        report.bytes_read += len as u64;
        observer(CyclePhase::Read, index)?;
    }

    debug!(
        path = %scratch.path().display(),
        chunks = report.chunks_written,
        "write/read cycle finished"
    );
    Ok(report)
}

/// `n` invocations one after another
#[instrument(skip(config, gate), fields(operations = config.operations))]
pub fn run_sequential(
    scratch_dir: &Path,
    config: &IoConfig,
    gate: &ExecutionGate,
) -> Result<IoRunSummary> {
    config.validate()?;
    let buffers = BufferPool::new(config.chunk_bytes() as usize, 2)?;

    let reports = (0..config.operations)
        .map(|_| run_cycle(scratch_dir, config, &buffers, gate))
        .collect::<Result<Vec<_>>>()?;

    Ok(IoRunSummary::from_reports(&reports))
}

/// `m` invocations submitted to the worker pool, joined before returning
#[instrument(skip(config, pool), fields(operations = config.operations, workers = pool.workers()))]
pub fn run_pooled(
    scratch_dir: &Path,
    config: &IoConfig,
    pool: &WorkerPool,
) -> Result<IoRunSummary> {
    config.validate()?;
    let buffers = BufferPool::new(config.chunk_bytes() as usize, 2 * pool.workers())?;

    let reports = pool.try_map(vec![(); config.operations], |gate, ()| {
        run_cycle(scratch_dir, config, &buffers, gate)
    })?;

    Ok(IoRunSummary::from_reports(&reports))
}

/// `(chunk index, length)` for every chunk of a `total`-byte file
fn chunk_lengths(total: u64, chunk_size: u64) -> impl Iterator<Item = (u64, usize)> {
    let chunks = total.div_ceil(chunk_size);
    (0..chunks).map(move |index| {
        let start = index * chunk_size;
        (index, (total - start).min(chunk_size) as usize)
    })
}

fn fill_chunk(seed: u64, index: u64, buf: &mut [u8]) {
    let mut rng = SmallRng::seed_from_u64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    rng.fill(buf);
}

fn verify_chunk(index: u64, chunk_size: u64, expected: &[u8], actual: &[u8]) -> Result<()> {
    match expected.iter().zip(actual).position(|(a, b)| a != b) {
        None => Ok(()),
        Some(pos) => Err(LockBenchError::DataMismatch {
            chunk: index,
            offset: index * chunk_size + pos as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn small_config() -> IoConfig {
        IoConfig {
            file_mb: 1,
            chunk_kb: 64,
            operations: 3,
            workers: 2,
        }
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_chunk_lengths() {
        let chunks: Vec<_> = chunk_lengths(10, 4).collect();
        assert_eq!(chunks, vec![(0, 4), (1, 4), (2, 2)]);
        assert_eq!(chunk_lengths(8, 4).count(), 2);
    }

    #[test]
    fn test_fill_chunk_is_deterministic() {
        let mut a = vec![0u8; 128];
        let mut b = vec![0u8; 128];
        fill_chunk(42, 3, &mut a);
        fill_chunk(42, 3, &mut b);
        assert_eq!(a, b);
        fill_chunk(42, 4, &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_chunk_reports_offset() {
        let expected = [1u8, 2, 3, 4];
        let actual = [1u8, 2, 9, 4];
        let err = verify_chunk(2, 4, &expected, &actual).unwrap_err();
        assert!(matches!(err, LockBenchError::DataMismatch { chunk: 2, offset: 10 }));
        assert!(verify_chunk(0, 4, &expected, &expected).is_ok());
    }

    #[test]
    fn test_cycle_reads_back_what_it_wrote() {
        let temp_dir = tempdir().unwrap();
        let config = small_config();
        let buffers = BufferPool::new(config.chunk_bytes() as usize, 2).unwrap();
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);

        let report = run_cycle(temp_dir.path(), &config, &buffers, &gate).unwrap();
        assert_eq!(report.preallocated_len, 1024 * 1024);
        assert_eq!(report.chunks_written, 16);
        assert_eq!(report.chunks_read, report.chunks_written);
        assert_eq!(report.bytes_read, report.bytes_written);
        assert!(dir_is_empty(temp_dir.path()));
        assert_eq!(buffers.pool_size().unwrap(), 2);
    }

    #[test]
    fn test_file_exists_only_during_cycle() {
        let temp_dir = tempdir().unwrap();
        let config = small_config();
        let buffers = BufferPool::new(config.chunk_bytes() as usize, 2).unwrap();
        let gate = ExecutionGate::new(ExecutionMode::GlobalLock);
        let dir = temp_dir.path().to_path_buf();

        let mut seen = 0;
        run_cycle_observed(temp_dir.path(), &config, &buffers, &gate, |_, _| {
            seen += 1;
            assert!(!dir_is_empty(&dir));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, 32);
        assert!(dir_is_empty(temp_dir.path()));
    }

    #[test]
    fn test_failure_mid_read_removes_file() {
        let temp_dir = tempdir().unwrap();
        let config = small_config();
        let buffers = BufferPool::new(config.chunk_bytes() as usize, 2).unwrap();
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);

        let result = run_cycle_observed(temp_dir.path(), &config, &buffers, &gate, |phase, index| {
            if phase == CyclePhase::Read && index == 3 {
                Err(LockBenchError::Benchmark("injected failure".to_string()))
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(LockBenchError::Benchmark(_))));
        assert!(dir_is_empty(temp_dir.path()));
    }

    #[test]
    fn test_failure_mid_write_removes_file() {
        let temp_dir = tempdir().unwrap();
        let config = small_config();
        let buffers = BufferPool::new(config.chunk_bytes() as usize, 2).unwrap();
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);

        let result = run_cycle_observed(temp_dir.path(), &config, &buffers, &gate, |phase, _| {
            match phase {
                CyclePhase::Write => Err(LockBenchError::Benchmark("disk full".to_string())),
                CyclePhase::Read => Ok(()),
            }
        });

        assert!(result.is_err());
        assert!(dir_is_empty(temp_dir.path()));
    }

    #[test]
    fn test_mismatched_buffer_size_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let buffers = BufferPool::new(4096, 2).unwrap();
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);
        let result = run_cycle(temp_dir.path(), &small_config(), &buffers, &gate);
        assert!(matches!(result, Err(LockBenchError::Config(_))));
    }

    #[test]
    fn test_sequential_and_pooled_runs() {
        let temp_dir = tempdir().unwrap();
        let config = small_config();
        let gate = Arc::new(ExecutionGate::new(ExecutionMode::FreeThreaded));

        let sequential = run_sequential(temp_dir.path(), &config, &gate).unwrap();
        assert_eq!(sequential.operations, 3);
        assert_eq!(sequential.bytes_written, 3 * 1024 * 1024);

        let pool = WorkerPool::new(config.workers, gate).unwrap();
        let pooled = run_pooled(temp_dir.path(), &config, &pool).unwrap();
        assert_eq!(pooled, sequential);
        assert!(dir_is_empty(temp_dir.path()));
    }

    #[test]
    fn test_missing_scratch_dir_fails_fast() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("gone");
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);
        let result = run_sequential(&missing, &small_config(), &gate);
        assert!(matches!(result, Err(LockBenchError::TempFile(_))));
    }
}
