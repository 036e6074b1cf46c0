//! Shared interrupt flag.
//!
//! The binary flips the flag from its Ctrl-C handler; handlers poll it, and
//! the console reports any handler outcome observed while it is set as an
//! interruption rather than a failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to one process-wide interrupt state.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::InterruptFlag;
///
/// let flag = InterruptFlag::new();
/// let handle = flag.clone();
/// handle.trigger();
/// assert!(flag.is_set());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the process as interrupted.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`trigger`](Self::trigger) has been called.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Resets the flag.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
