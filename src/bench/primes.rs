//! CPU-bound partitioned prime counting
//!
//! Counts primes in `[2, upper)` either in one sequential pass or by splitting
//! the range into fixed-size partitions, one unit of work each, and summing
//! the collected per-partition counts after the pool join.

use std::ops::Range;

use tracing::{debug, instrument};

use crate::bench::worker::WorkerPool;
use crate::probe::ExecutionGate;
use crate::{LockBenchError, Result};

/// First integer considered by every count
pub const RANGE_START: u64 = 2;

/// Contiguous half-open interval owned by one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: u64,
    pub end: u64,
}

impl Partition {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Trial division by odd divisors up to `isqrt(n)`
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let limit = integer_sqrt(n);
    let mut divisor = 3;
    while divisor <= limit {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

fn integer_sqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |square| square > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).is_some_and(|square| square <= n) {
        root += 1;
    }
    root
}

/// Split `[2, upper)` into consecutive chunks of `chunk_size`; the last may be shorter
pub fn partition(upper: u64, chunk_size: u64) -> Result<Vec<Partition>> {
    if chunk_size == 0 {
        return Err(LockBenchError::Config("Chunk size must be greater than 0".to_string()));
    }

    let mut partitions = Vec::new();
    let mut start = RANGE_START;
    while start < upper {
        let end = start.saturating_add(chunk_size).min(upper);
        partitions.push(Partition { start, end });
        start = end;
    }
    Ok(partitions)
}

/// How many partitions `partition` would produce, without building them
pub fn partition_count(upper: u64, chunk_size: u64) -> Result<u64> {
    if chunk_size == 0 {
        return Err(LockBenchError::Config("Chunk size must be greater than 0".to_string()));
    }
    Ok(upper.saturating_sub(RANGE_START).div_ceil(chunk_size))
}

/// Number of primes within one partition
pub fn count_in(partition: Partition) -> u64 {
    partition.range().filter(|&n| is_prime(n)).count() as u64
}

/// Count primes in `[2, upper)` in a single pass under the gate
#[instrument(skip(gate))]
pub fn count_sequential(upper: u64, gate: &ExecutionGate) -> u64 {
    let whole = Partition {
        start: RANGE_START,
        end: upper.max(RANGE_START),
    };
    gate.enter(|| count_in(whole))
}

/// Count primes in `[2, upper)` with one pool unit per partition
#[instrument(skip(pool), fields(workers = pool.workers()))]
pub fn count_partitioned(
    upper: u64,
    chunk_size: u64,
    pool: &WorkerPool,
) -> Result<PartitionedCount> {
    let partitions = partition(upper, chunk_size)?;
    let units = partitions.len();

    let per_partition = pool.map(partitions, |gate, part| gate.enter(|| count_in(part)));
    let count: u64 = per_partition.iter().sum();

    debug!(units, count, "partitioned count joined");
    Ok(PartitionedCount { count, partitions: units })
}

/// Total and number of units from a partitioned count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionedCount {
    pub count: u64,
    pub partitions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;
    use std::sync::Arc;

    fn pool(workers: usize, mode: ExecutionMode) -> WorkerPool {
        WorkerPool::new(workers, Arc::new(ExecutionGate::new(mode))).unwrap()
    }

    #[test]
    fn test_is_prime_known_values() {
        assert!(is_prime(2));
        assert!(!is_prime(4));
        assert!(is_prime(97));
        assert!(!is_prime(100));
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(3));
        for square in [9, 25, 49, 121, 169] {
            assert!(!is_prime(square), "{} is a square", square);
        }
        assert!(is_prime(1_000_003));
    }

    #[test]
    fn test_is_prime_matches_naive_definition() {
        for n in 0..2000u64 {
            let naive = n >= 2 && (2..n).all(|d| n % d != 0);
            assert_eq!(is_prime(n), naive, "n = {}", n);
        }
    }

    #[test]
    fn test_integer_sqrt() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(48), 6);
        assert_eq!(integer_sqrt(49), 7);
        assert_eq!(integer_sqrt(u64::MAX), u32::MAX as u64);
    }

    #[test]
    fn test_partitions_cover_range_exactly() {
        for (upper, chunk) in [(100u64, 7u64), (2, 5), (3, 1), (50_002, 50_000), (1000, 1000)] {
            let parts = partition(upper, chunk).unwrap();
            let mut expected_start = RANGE_START;
            for part in &parts {
                assert_eq!(part.start, expected_start);
                assert!(!part.is_empty());
                assert!(part.len() <= chunk);
                expected_start = part.end;
            }
            if upper > RANGE_START {
                assert_eq!(expected_start, upper);
                assert!(parts[..parts.len() - 1].iter().all(|p| p.len() == chunk));
            } else {
                assert!(parts.is_empty());
            }
        }
    }

    #[test]
    fn test_partition_last_chunk_shorter() {
        let parts = partition(20, 5).unwrap();
        assert_eq!(
            parts,
            vec![
                Partition { start: 2, end: 7 },
                Partition { start: 7, end: 12 },
                Partition { start: 12, end: 17 },
                Partition { start: 17, end: 20 },
            ]
        );
    }

    #[test]
    fn test_partition_count_matches_partition() {
        for upper in [0u64, 1, 2, 3, 52, 53, 2_000_000] {
            for chunk in [1u64, 7, 50, 50_000, u64::MAX] {
                let built = partition(upper, chunk).unwrap().len() as u64;
                let counted = partition_count(upper, chunk).unwrap();
                assert_eq!(counted, built, "upper={} chunk={}", upper, chunk);
            }
        }
        assert_eq!(partition_count(2_000_000, 50_000).unwrap(), 40);
        assert!(partition_count(10, 0).is_err());
    }

    #[test]
    fn test_partition_rejects_zero_chunk() {
        assert!(matches!(partition(100, 0), Err(LockBenchError::Config(_))));
    }

    #[test]
    fn test_small_upper_bounds() {
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);
        assert_eq!(count_sequential(0, &gate), 0);
        assert_eq!(count_sequential(2, &gate), 0);
        assert_eq!(count_sequential(3, &gate), 1);
        assert_eq!(count_sequential(100, &gate), 25);

        let pool = pool(2, ExecutionMode::FreeThreaded);
        let result = count_partitioned(1, 10, &pool).unwrap();
        assert_eq!(result, PartitionedCount { count: 0, partitions: 0 });
    }

    #[test]
    fn test_sequential_equals_partitioned() {
        let pool = pool(4, ExecutionMode::FreeThreaded);
        for upper in [3u64, 10, 101, 1_000, 12_345, 100_000] {
            for chunk in [1u64, 7, 1_000, 50_000] {
                let sequential = count_sequential(upper, pool.gate());
                let partitioned = count_partitioned(upper, chunk, &pool).unwrap();
                assert_eq!(sequential, partitioned.count, "upper={} chunk={}", upper, chunk);
            }
        }
    }

    #[test]
    fn test_global_lock_mode_gives_same_count() {
        let free = pool(4, ExecutionMode::FreeThreaded);
        let locked = pool(4, ExecutionMode::GlobalLock);
        assert_eq!(
            count_partitioned(50_000, 3_000, &free).unwrap(),
            count_partitioned(50_000, 3_000, &locked).unwrap()
        );
        assert_eq!(count_sequential(50_000, locked.gate()), 5_133);
    }
}
