//! Input event disambiguation
//!
//! Holding the button while turning the knob adjusts color balance, so a
//! hold that involved any rotation must never be read as a long press or
//! an extended (reset) press. Each press latches "rotated" the moment a
//! counter delta is seen, and the latch is consulted before any
//! hold-duration classification.
//!
//! Order within one [`InputDetector::poll`]:
//! 1. press edge (starts a hold, clears the latch, enters `ColorBalance`)
//! 2. rotation sample (sets the latch if the button was down this pass)
//! 3. release edge (classifies click / long press, back to `Brightness`)
//! 4. extended threshold while still held

/// What rotation adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Button released
    Brightness,
    /// Button held
    ColorBalance,
}

/// Disambiguated input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Clockwise detents, with the mode in effect when they were sampled
    RotateCw { steps: u32, mode: Mode },
    /// Counter-clockwise detents
    RotateCcw { steps: u32, mode: Mode },
    /// Press released before the long-press threshold
    Click,
    /// Press released between the long-press and extended thresholds
    LongPress,
    /// Press held past the extended threshold
    ExtendedPress,
}

#[derive(Debug, Clone)]
pub struct InputDetector {
    long_press_ms: u32,
    extended_press_ms: u32,
    mode: Mode,
    pressed: bool,
    press_start_ms: u32,
    rotated_during_press: bool,
    extended_fired: bool,
    last_count: i32,
}

impl InputDetector {
    /// Create a detector; `count` is the counter value to take deltas from
    pub fn new(long_press_ms: u32, extended_press_ms: u32, count: i32) -> Self {
        Self {
            long_press_ms,
            extended_press_ms,
            mode: Mode::Brightness,
            pressed: false,
            press_start_ms: 0,
            rotated_during_press: false,
            extended_fired: false,
            last_count: count,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Whether the current (or last) press involved rotation
    pub fn rotated_during_press(&self) -> bool {
        self.rotated_during_press
    }

    /// Process one polling pass
    ///
    /// `count` is the raw rotation counter, `pressed` the debounced button
    /// level. At most one event results from a pass: rotation during a hold
    /// latches and so silences the button for that press.
    pub fn poll(&mut self, now_ms: u32, count: i32, pressed: bool) -> Option<InputEvent> {
        let was_pressed = self.pressed;

        if pressed && !was_pressed {
            self.pressed = true;
            self.press_start_ms = now_ms;
            self.rotated_during_press = false;
            self.extended_fired = false;
            self.mode = Mode::ColorBalance;
        }

        let rotation = self.sample_rotation(count, was_pressed);

        if !pressed && was_pressed {
            let released = self.release(now_ms);
            return rotation.or(released);
        }

        if rotation.is_some() {
            return rotation;
        }

        if self.pressed
            && !self.rotated_during_press
            && !self.extended_fired
            && now_ms.wrapping_sub(self.press_start_ms) >= self.extended_press_ms
        {
            self.extended_fired = true;
            return Some(InputEvent::ExtendedPress);
        }

        None
    }

    fn sample_rotation(&mut self, count: i32, was_pressed: bool) -> Option<InputEvent> {
        let delta = count.wrapping_sub(self.last_count);
        self.last_count = count;
        if delta == 0 {
            return None;
        }

        if was_pressed || self.pressed {
            self.rotated_during_press = true;
        }

        let steps = delta.unsigned_abs();
        let mode = self.mode;
        Some(if delta > 0 {
            InputEvent::RotateCw { steps, mode }
        } else {
            InputEvent::RotateCcw { steps, mode }
        })
    }

    fn release(&mut self, now_ms: u32) -> Option<InputEvent> {
        self.pressed = false;
        self.mode = Mode::Brightness;

        if self.rotated_during_press || self.extended_fired {
            return None;
        }

        let held = now_ms.wrapping_sub(self.press_start_ms);
        if held < self.long_press_ms {
            Some(InputEvent::Click)
        } else if held < self.extended_press_ms {
            Some(InputEvent::LongPress)
        } else {
            // Threshold crossed between polls
            self.extended_fired = true;
            Some(InputEvent::ExtendedPress)
        }
    }
}
