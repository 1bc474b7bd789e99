//! Single-threaded CPU summation loop

use std::hint::black_box;

use tracing::instrument;

use crate::config::SummationConfig;
use crate::probe::ExecutionGate;

/// Sum `0..iterations` with wrapping arithmetic, `repeats` times, under the
/// gate. Returns the sum of the last repeat.
#[instrument(skip(gate))]
pub fn run_summation(config: &SummationConfig, gate: &ExecutionGate) -> u64 {
    let mut total = 0u64;
    for _ in 0..config.repeats {
        total = gate.enter(|| sum_to(config.iterations));
    }
    total
}

fn sum_to(iterations: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..iterations {
        acc = black_box(acc.wrapping_add(i));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;

    #[test]
    fn test_sum_matches_closed_form() {
        let gate = ExecutionGate::new(ExecutionMode::FreeThreaded);
        for iterations in [0u64, 1, 2, 10, 12_345] {
            let config = SummationConfig { iterations, repeats: 2 };
            let expected = iterations * iterations.saturating_sub(1) / 2;
            assert_eq!(run_summation(&config, &gate), expected);
        }
    }

    #[test]
    fn test_zero_repeats_sums_nothing() {
        let gate = ExecutionGate::new(ExecutionMode::GlobalLock);
        let config = SummationConfig { iterations: 100, repeats: 0 };
        assert_eq!(run_summation(&config, &gate), 0);
    }
}
