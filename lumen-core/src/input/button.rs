//! Debounced push button

use lumen_hal::InputPin;

use crate::config::InputConfig;

/// Time-based debouncer
///
/// A raw level has to hold for `debounce_ms` before it becomes the stable
/// level.
#[derive(Debug, Clone)]
pub struct Debouncer {
    debounce_ms: u32,
    stable: bool,
    candidate: bool,
    since_ms: u32,
}

impl Debouncer {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            stable: false,
            candidate: false,
            since_ms: 0,
        }
    }

    /// Feed a raw sample, returning the stable level
    pub fn update(&mut self, now_ms: u32, raw: bool) -> bool {
        if raw != self.candidate {
            self.candidate = raw;
            self.since_ms = now_ms;
        }
        if self.candidate != self.stable
            && now_ms.wrapping_sub(self.since_ms) >= self.debounce_ms
        {
            self.stable = self.candidate;
        }
        self.stable
    }

    pub fn level(&self) -> bool {
        self.stable
    }
}

/// Active-low push button on a GPIO
pub struct Button<P> {
    pin: P,
    debouncer: Debouncer,
}

impl<P: InputPin> Button<P> {
    /// Debounce with `config.debounce_ms`
    pub fn new(pin: P, config: &InputConfig) -> Self {
        Self {
            pin,
            debouncer: Debouncer::new(config.debounce_ms),
        }
    }

    /// Sample the pin and return the debounced pressed state
    pub fn sample(&mut self, now_ms: u32) -> bool {
        self.debouncer.update(now_ms, self.pin.is_low())
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}
