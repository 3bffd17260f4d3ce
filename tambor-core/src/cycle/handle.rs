//! Single-run guard
//!
//! Claimed by whoever requests a start and released by the sequencer task
//! when the run finishes or its cleanup completes, so a second start can
//! never slip in while a cycle (or its drain) is still alive.

use portable_atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct CycleHandle {
    running: AtomicBool,
}

impl CycleHandle {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Claim the handle; false if a run already holds it
    pub fn try_claim(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
