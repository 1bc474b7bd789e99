//! Execution mode probe and gate
//!
//! The gate is the conceptual interpreter lock: in global-lock mode every
//! compute section runs while holding one process-wide mutex, so at most one
//! worker computes at a time. Blocking system calls are made outside it.

use std::sync::Mutex;

use crate::config::ExecutionMode;

/// Capability query answering whether a global execution lock is active
pub trait LockProbe: Send + Sync {
    /// Whether compute sections are serialized across worker threads
    fn global_lock_active(&self) -> bool;

    /// The execution mode this probe reports
    fn mode(&self) -> ExecutionMode {
        if self.global_lock_active() {
            ExecutionMode::GlobalLock
        } else {
            ExecutionMode::FreeThreaded
        }
    }
}

/// Probe with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub ExecutionMode);

impl LockProbe for StaticProbe {
    fn global_lock_active(&self) -> bool {
        matches!(self.0, ExecutionMode::GlobalLock)
    }
}

/// Process-wide execution gate shared by all workers of a run
#[derive(Debug)]
pub struct ExecutionGate {
    lock: Option<Mutex<()>>,
}

impl ExecutionGate {
    pub fn new(mode: ExecutionMode) -> Self {
        let lock = match mode {
            ExecutionMode::GlobalLock => Some(Mutex::new(())),
            ExecutionMode::FreeThreaded => None,
        };
        Self { lock }
    }

    /// Run a compute section under the gate
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.lock {
            Some(lock) => {
                // The gate guards no data, so a poisoned lock is still usable.
                let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                f()
            }
            None => f(),
        }
    }
}

impl LockProbe for ExecutionGate {
    fn global_lock_active(&self) -> bool {
        self.lock.is_some()
    }
}
