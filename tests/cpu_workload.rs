use std::sync::Arc;

use lockbench::bench::primes::{count_partitioned, count_sequential, partition};
use lockbench::bench::{Harness, WorkerPool};
use lockbench::config::{ExecutionMode, HarnessConfig};
use lockbench::models::Outcome;
use lockbench::probe::ExecutionGate;

#[test]
fn test_two_million_sequential_matches_partitioned() {
    let gate = Arc::new(ExecutionGate::new(ExecutionMode::FreeThreaded));
    let pool = WorkerPool::new(8, Arc::clone(&gate)).expect("pool");

    let sequential = count_sequential(2_000_000, &gate);
    let partitioned = count_partitioned(2_000_000, 50_000, &pool).expect("partitioned count");

    assert_eq!(sequential, 148_933);
    assert_eq!(partitioned.count, sequential);
    assert_eq!(partitioned.partitions, 40);
}

#[test]
fn test_partition_count_for_default_config() {
    let parts = partition(2_000_000, 50_000).expect("partition");
    assert_eq!(parts.len(), 40);
    assert_eq!(parts[0].start, 2);
    assert_eq!(parts[39].end, 2_000_000);
    assert_eq!(parts[39].len(), 49_998);
}

#[test]
fn test_harness_cpu_run_under_both_modes() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    for mode in [ExecutionMode::GlobalLock, ExecutionMode::FreeThreaded] {
        let config = HarnessConfig::default()
            .with_scratch_dir(temp_dir.path().to_path_buf())
            .with_mode(mode)
            .with_cpu(200_000, 10_000, 4);
        let samples = Harness::new(config).expect("harness").run_cpu().expect("cpu run");

        for sample in &samples {
            assert_eq!(sample.mode, mode);
            match sample.outcome {
                Outcome::Primes { count, .. } => assert_eq!(count, 17_984),
                ref other => panic!("unexpected outcome {:?}", other),
            }
        }
    }
}
