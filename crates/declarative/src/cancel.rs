//! Cooperative cancellation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag checked by the executor before each step
///
/// Clones share the same flag. Setting it is async-signal-safe, so a
/// signal handler may hold a clone and call [`cancel`](Self::cancel).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the token can guard another command
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
