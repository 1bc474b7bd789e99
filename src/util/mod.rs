//! Utility functions module
//!
//! Formatting helpers for sizes, elapsed times and throughput.

pub mod units;

pub use units::{calculate_throughput_mbps, format_bytes, format_elapsed};
