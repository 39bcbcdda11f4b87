//! Interrupt-shared rotation counter

use portable_atomic::{AtomicI32, Ordering};

/// Free-running detent count
///
/// Written only by the encoder interrupt, read by the main loop. The loop
/// never resets it; it keeps its own snapshot and works with deltas.
#[derive(Debug)]
pub struct RotaryCounter {
    count: AtomicI32,
}

impl Default for RotaryCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RotaryCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicI32::new(0),
        }
    }

    /// Add `steps` detents. Safe to call from interrupt context.
    pub fn record(&self, steps: i32) {
        self.count.fetch_add(steps, Ordering::Relaxed);
    }

    /// Current count, wrapping at the `i32` range
    pub fn load(&self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }
}
