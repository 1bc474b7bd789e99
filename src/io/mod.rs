//! I/O operations module
//!
//! Scratch files with guaranteed cleanup and a recycling buffer pool
//! for the write/read cycle workload.

pub mod buffer;
pub mod disk;

pub use buffer::{BufferPool, PooledBuffer};
pub use disk::ScratchFile;
