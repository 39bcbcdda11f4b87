//! Dual-channel LED output
//!
//! The driver mixes two LED strings (warm and cool) from one brightness and
//! a color balance. Duty computation lives in `lumen-protocol`; this trait
//! only moves the hardware.

/// One of the two PWM outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedChannel {
    /// Warm string (duty = brightness * balance)
    Warm,
    /// Cool string (duty = brightness * (1 - balance))
    Cool,
}

/// PWM output with hardware fades
pub trait LampOutput {
    /// Fade `channel` to `duty` over `duration_ms`
    ///
    /// A zero duration sets the duty immediately. Implementations must not
    /// block for the length of the fade.
    fn fade(&mut self, channel: LedChannel, duty: u16, duration_ms: u32);
}
