//! Units formatting utilities
//!
//! Human-readable sizes, elapsed times and rates for benchmark output.

use std::time::Duration;

/// Format bytes into human-readable size with binary units
///
/// # Examples
/// ```
/// use lockbench::util::units::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(65536), "64.0 KiB");
/// assert_eq!(format_bytes(25165824), "24.0 MiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format an elapsed time at millisecond resolution
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use lockbench::util::units::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_millis(1500)), "1s 500ms");
/// assert_eq!(format_elapsed(Duration::from_micros(10)), "0s");
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}

/// Throughput in MiB/s
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use lockbench::util::units::calculate_throughput_mbps;
///
/// let throughput = calculate_throughput_mbps(1048576, Duration::from_secs(1));
/// assert!((throughput - 1.0).abs() < 0.01);
/// ```
pub fn calculate_throughput_mbps(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    bytes as f64 / 1_048_576.0 / duration.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1073741824), "1.0 GiB");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_elapsed(Duration::from_nanos(2_345_678)), "2ms");
    }

    #[test]
    fn test_rates_with_zero_duration() {
        assert_eq!(calculate_throughput_mbps(1024, Duration::ZERO), 0.0);
        assert_eq!(calculate_throughput_mbps(2 * 1_048_576, Duration::from_secs(2)), 1.0);
    }
}
