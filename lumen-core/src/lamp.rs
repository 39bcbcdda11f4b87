//! Driver lamp controller
//!
//! Holds the authoritative [`LampState`] and the state saved at the last
//! power off, and moves the PWM outputs whenever either changes. Duties are
//! always recomputed from the state, never stored.

use lumen_hal::{LampOutput, LedChannel};
use lumen_protocol::{Duties, LampState};

use crate::config::LampConfig;

pub struct LampController<O> {
    output: O,
    config: LampConfig,
    state: LampState,
    last_on: LampState,
}

impl<O: LampOutput> LampController<O> {
    /// Start dark with the default brightness and balance
    pub fn new(output: O, config: LampConfig) -> Self {
        Self {
            output,
            config,
            state: LampState::default(),
            last_on: LampState::default(),
        }
    }

    pub fn state(&self) -> LampState {
        self.state
    }

    /// Brightness and balance a restoring power on will use
    pub fn last_on(&self) -> LampState {
        self.last_on
    }

    pub fn duties(&self) -> Duties {
        self.state.duties()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Seed the saved state from storage. Does not touch the outputs.
    pub fn restore_last_on(&mut self, saved: LampState) {
        let saved = saved.clamped();
        if saved.is_unset() {
            return;
        }
        self.last_on = LampState {
            is_on: false,
            ..saved
        };
        self.state.brightness = saved.brightness;
        self.state.color_balance = saved.color_balance;
    }

    /// Turn on with `attached`, or with the saved state when `None`
    pub fn power_on(&mut self, attached: Option<LampState>) {
        let source = attached.unwrap_or(self.last_on).clamped();
        let target = LampState {
            is_on: true,
            ..source
        };
        debug!(
            "power on: brightness {} balance {}",
            target.brightness, target.color_balance
        );
        self.transition(target, self.config.power_fade_ms, 0);
    }

    /// Save brightness and balance, then fade to dark
    pub fn power_off(&mut self) {
        self.last_on = LampState {
            is_on: false,
            ..self.state
        };
        let target = LampState {
            is_on: false,
            ..self.state
        };
        debug!("power off, saved brightness {}", self.last_on.brightness);
        self.transition(target, self.config.power_fade_ms, 0);
    }

    /// Adopt brightness, balance and on flag as given
    pub fn set_state(&mut self, state: LampState) {
        self.transition(state.clamped(), 0, self.config.step_fade_ms);
    }

    /// Fade every channel that changes
    ///
    /// Duration is `fixed_ms` plus `per_step_ms` for each duty step moved.
    fn transition(&mut self, target: LampState, fixed_ms: u32, per_step_ms: u32) {
        let from = self.state.duties();
        let to = target.duties();
        self.state = target;

        for (channel, old, new) in [
            (LedChannel::Warm, from.ch0, to.ch0),
            (LedChannel::Cool, from.ch1, to.ch1),
        ] {
            if old == new {
                continue;
            }
            let steps = u32::from(old.abs_diff(new));
            let duration = fixed_ms.saturating_add(steps.saturating_mul(per_step_ms));
            self.output.fade(channel, new, duration);
        }
    }
}
