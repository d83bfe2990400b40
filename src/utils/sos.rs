//! Cooperative cancellation shared between the control thread and stage threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation token handed to the coordinator and observed by every stage.
///
/// Clones share the same flag; cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct SignalOfStop {
    closing: Arc<AtomicBool>,
}

impl SignalOfStop {
    pub fn new() -> SignalOfStop {
        SignalOfStop::default()
    }

    pub fn cancel(&self) {
        self.closing.store(true, Ordering::Release);
    }

    pub fn cancelled(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}
