//! Controller idle policy and status indicator

use crate::config::{PowerConfig, INDICATOR_BLINK_MS};

/// Decides when the controller may go to sleep
///
/// Checked at a coarse interval; only a paired controller sleeps, so
/// discovery is never cut short.
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    config: PowerConfig,
    last_activity_ms: u32,
    last_check_ms: u32,
}

impl IdleMonitor {
    pub fn new(config: PowerConfig, now_ms: u32) -> Self {
        Self {
            config,
            last_activity_ms: now_ms,
            last_check_ms: now_ms,
        }
    }

    /// Record user input
    pub fn note_activity(&mut self, now_ms: u32) {
        self.last_activity_ms = now_ms;
    }

    pub fn idle_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_activity_ms)
    }

    /// Whether it is time to sleep. Evaluates at most once per check interval.
    pub fn should_sleep(&mut self, now_ms: u32, paired: bool) -> bool {
        if now_ms.wrapping_sub(self.last_check_ms) < self.config.check_interval_ms {
            return false;
        }
        self.last_check_ms = now_ms;
        paired && self.idle_ms(now_ms) >= self.config.sleep_timeout_ms
    }
}

/// Status LED level: solid while paired, blinking otherwise
pub fn indicator_level(paired: bool, now_ms: u32) -> bool {
    paired || (now_ms / INDICATOR_BLINK_MS) % 2 == 0
}
