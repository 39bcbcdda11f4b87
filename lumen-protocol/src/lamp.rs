//! Lamp state and derived PWM duties

/// Full-scale PWM duty (9-bit timer)
pub const MAX_DUTY: u16 = 511;

/// Bytes a [`LampState`] occupies on the wire
pub const LAMP_STATE_SIZE: usize = 7;

/// User-visible lamp state
///
/// `brightness` is in duty units (0..=[`MAX_DUTY`]); `color_balance` is the
/// warm share of that brightness (0.0 = all cool, 1.0 = all warm).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LampState {
    pub is_on: bool,
    pub brightness: u16,
    pub color_balance: f32,
}

/// PWM duties derived from a [`LampState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duties {
    /// Warm string
    pub ch0: u16,
    /// Cool string
    pub ch1: u16,
}

impl Duties {
    pub const OFF: Duties = Duties { ch0: 0, ch1: 0 };
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            is_on: false,
            brightness: 255,
            color_balance: 0.5,
        }
    }
}

impl LampState {
    /// Attached to a `PowerOn` that should restore the driver's saved state
    pub const UNSET: LampState = LampState {
        is_on: false,
        brightness: 0,
        color_balance: 0.0,
    };

    pub fn new(is_on: bool, brightness: u16, color_balance: f32) -> Self {
        Self {
            is_on,
            brightness,
            color_balance,
        }
    }

    /// A state carrying no brightness, i.e. nothing meaningful to adopt
    pub fn is_unset(&self) -> bool {
        self.brightness == 0
    }

    /// Check field ranges: brightness within duty range, balance finite in [0, 1]
    pub fn is_valid(&self) -> bool {
        self.brightness <= MAX_DUTY
            && self.color_balance.is_finite()
            && (0.0..=1.0).contains(&self.color_balance)
    }

    /// Copy with brightness and balance forced into range
    pub fn clamped(self) -> Self {
        let color_balance = if self.color_balance.is_finite() {
            self.color_balance.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self {
            is_on: self.is_on,
            brightness: self.brightness.min(MAX_DUTY),
            color_balance,
        }
    }

    /// Channel duties for this state. Both are zero while off.
    pub fn duties(&self) -> Duties {
        if !self.is_on {
            return Duties::OFF;
        }
        let state = self.clamped();
        let brightness = state.brightness as f32;
        Duties {
            ch0: (brightness * state.color_balance) as u16,
            ch1: (brightness * (1.0 - state.color_balance)) as u16,
        }
    }

    /// Write the 7-byte wire form into `buf`
    pub(crate) fn write_to(&self, buf: &mut [u8; LAMP_STATE_SIZE]) {
        buf[0] = self.is_on as u8;
        buf[1..3].copy_from_slice(&self.brightness.to_le_bytes());
        buf[3..7].copy_from_slice(&self.color_balance.to_le_bytes());
    }

    /// Read the 7-byte wire form. Returns `None` for out-of-range fields.
    pub(crate) fn read_from(buf: &[u8; LAMP_STATE_SIZE]) -> Option<Self> {
        let is_on = match buf[0] {
            0 => false,
            1 => true,
            _ => return None,
        };
        let state = Self {
            is_on,
            brightness: u16::from_le_bytes([buf[1], buf[2]]),
            color_balance: f32::from_le_bytes([buf[3], buf[4], buf[5], buf[6]]),
        };
        state.is_valid().then_some(state)
    }
}
