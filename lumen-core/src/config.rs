//! Tunable constants and per-node configuration
//!
//! Defaults mirror the shipped hardware: a 20-detent encoder, a 9-bit PWM
//! driver and a 2.4 GHz radio on channels 1..=13.

use lumen_protocol::MAX_DUTY;

// Input
pub const DEBOUNCE_MS: u32 = 50;
pub const LONG_PRESS_MS: u32 = 2000;
pub const EXTENDED_PRESS_MS: u32 = 5000;
pub const MIN_BRIGHTNESS: u16 = 10;
pub const MAX_BRIGHTNESS: u16 = MAX_DUTY;
/// Brightness change per encoder detent
pub const BRIGHTNESS_STEP: u16 = 1;
/// Balance change per encoder detent (5/255)
pub const BALANCE_STEP: f32 = 5.0 / 255.0;

// Pairing
pub const PAIRING_RESPONSE_TIMEOUT_MS: u32 = 1000;
/// Full passes over channels 1..=13 before giving up
pub const PAIRING_MAX_PASSES: u8 = 3;
pub const PAIRING_REPLY_ATTEMPTS: u8 = 3;
pub const PAIRING_REPLY_DELAY_MS: u32 = 100;
/// Consecutive command failures that send a resumed session back to discovery
pub const REDISCOVER_AFTER_FAILURES: u8 = 3;

// Commands
pub const SEND_MAX_ATTEMPTS: u8 = 3;
pub const SEND_RETRY_DELAY_MS: u32 = 50;

// Driver
pub const MAX_CONTROLLERS: usize = 3;
pub const STEP_FADE_MS: u32 = 10;
pub const POWER_FADE_MS: u32 = 2000;

// Power
pub const SLEEP_TIMEOUT_MS: u32 = 5000;
pub const SLEEP_CHECK_INTERVAL_MS: u32 = 500;
pub const INDICATOR_BLINK_MS: u32 = 500;

/// Channel-scanning discovery parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairingConfig {
    /// How long to wait on one channel for a driver reply
    pub response_timeout_ms: u32,
    /// Full channel passes before `Timeout`
    pub max_passes: u8,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: PAIRING_RESPONSE_TIMEOUT_MS,
            max_passes: PAIRING_MAX_PASSES,
        }
    }
}

/// Bounded retry policy for unicast sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendConfig {
    pub max_attempts: u8,
    pub retry_delay_ms: u32,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            max_attempts: SEND_MAX_ATTEMPTS,
            retry_delay_ms: SEND_RETRY_DELAY_MS,
        }
    }
}

/// Button timing and encoder step sizes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputConfig {
    pub debounce_ms: u32,
    pub long_press_ms: u32,
    pub extended_press_ms: u32,
    pub brightness_step: u16,
    pub balance_step: f32,
    pub min_brightness: u16,
    pub max_brightness: u16,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            long_press_ms: LONG_PRESS_MS,
            extended_press_ms: EXTENDED_PRESS_MS,
            brightness_step: BRIGHTNESS_STEP,
            balance_step: BALANCE_STEP,
            min_brightness: MIN_BRIGHTNESS,
            max_brightness: MAX_BRIGHTNESS,
        }
    }
}

/// Fade timing on the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LampConfig {
    /// Fade time per duty step for state changes
    pub step_fade_ms: u32,
    /// Fade time for power on and power off
    pub power_fade_ms: u32,
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            step_fade_ms: STEP_FADE_MS,
            power_fade_ms: POWER_FADE_MS,
        }
    }
}

/// Controller idle-sleep policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    pub sleep_timeout_ms: u32,
    pub check_interval_ms: u32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            sleep_timeout_ms: SLEEP_TIMEOUT_MS,
            check_interval_ms: SLEEP_CHECK_INTERVAL_MS,
        }
    }
}

/// Everything the controller node needs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    pub pairing: PairingConfig,
    pub send: SendConfig,
    pub input: InputConfig,
    pub power: PowerConfig,
    /// Consecutive failed commands before rediscovery, 0 disables
    pub rediscover_after_failures: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pairing: PairingConfig::default(),
            send: SendConfig::default(),
            input: InputConfig::default(),
            power: PowerConfig::default(),
            rediscover_after_failures: REDISCOVER_AFTER_FAILURES,
        }
    }
}

/// Everything the driver node needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    pub lamp: LampConfig,
    /// Retry policy for state echoes
    pub response: SendConfig,
    pub reply_attempts: u8,
    pub reply_delay_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            lamp: LampConfig::default(),
            response: SendConfig::default(),
            reply_attempts: PAIRING_REPLY_ATTEMPTS,
            reply_delay_ms: PAIRING_REPLY_DELAY_MS,
        }
    }
}
