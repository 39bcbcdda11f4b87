//! Event emission policy: input events to lamp intents

use lumen_protocol::{Command, LampState};

use super::detector::{InputEvent, Mode};
use crate::config::InputConfig;

/// What the controller wants the driver to do
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Intent {
    /// Adjust brightness or balance while on
    SetState(LampState),
    /// Turn on with this state, or with the driver's saved state on `None`
    PowerOn(Option<LampState>),
    PowerOff,
    /// Forget the bound driver and rediscover
    ResetPairing,
}

impl Intent {
    /// Controller's optimistic view of the lamp after this intent
    pub fn apply_local(&self, current: LampState) -> LampState {
        match *self {
            Intent::SetState(state) | Intent::PowerOn(Some(state)) => state,
            Intent::PowerOn(None) => LampState {
                is_on: true,
                ..current
            },
            Intent::PowerOff => LampState {
                is_on: false,
                ..current
            },
            Intent::ResetPairing => current,
        }
    }

    /// Command and attached state to put on the wire
    pub fn command(&self, current: LampState) -> Option<(Command, LampState)> {
        match *self {
            Intent::SetState(state) => Some((Command::SetState, state)),
            Intent::PowerOn(Some(state)) => Some((Command::PowerOn, state)),
            Intent::PowerOn(None) => Some((Command::PowerOn, LampState::UNSET)),
            Intent::PowerOff => Some((
                Command::PowerOff,
                LampState {
                    is_on: false,
                    ..current
                },
            )),
            Intent::ResetPairing => None,
        }
    }
}

/// Map an input event onto the current lamp state
///
/// - rotation while off turns the lamp on with its current settings
/// - rotation while on adjusts brightness or balance by mode, clamped
/// - click only turns on; long press only turns off
/// - extended press resets pairing regardless of lamp state
pub fn intent_for(event: InputEvent, current: &LampState, config: &InputConfig) -> Option<Intent> {
    match event {
        InputEvent::RotateCw { steps, mode } => rotate(current, config, signed(steps), mode),
        InputEvent::RotateCcw { steps, mode } => {
            rotate(current, config, signed(steps).saturating_neg(), mode)
        }
        InputEvent::Click => (!current.is_on).then_some(Intent::PowerOn(None)),
        InputEvent::LongPress => current.is_on.then_some(Intent::PowerOff),
        InputEvent::ExtendedPress => Some(Intent::ResetPairing),
    }
}

fn signed(steps: u32) -> i32 {
    i32::try_from(steps).unwrap_or(i32::MAX)
}

fn rotate(current: &LampState, config: &InputConfig, delta: i32, mode: Mode) -> Option<Intent> {
    if !current.is_on {
        return Some(Intent::PowerOn(Some(LampState {
            is_on: true,
            ..*current
        })));
    }

    let mut next = *current;
    match mode {
        Mode::Brightness => {
            let step = i32::from(config.brightness_step);
            let brightness = i32::from(current.brightness)
                .saturating_add(delta.saturating_mul(step))
                .clamp(i32::from(config.min_brightness), i32::from(config.max_brightness));
            // Clamped into u16 range above
            next.brightness = brightness as u16;
        }
        Mode::ColorBalance => {
            let balance = current.color_balance + delta as f32 * config.balance_step;
            next.color_balance = balance.clamp(0.0, 1.0);
        }
    }

    (next != *current).then_some(Intent::SetState(next))
}
