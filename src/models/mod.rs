//! Data models module
//!
//! Contains the timing sample produced by every measured run.

pub mod sample;

pub use sample::{Outcome, SystemInfo, TimingSample, WorkloadKind};
