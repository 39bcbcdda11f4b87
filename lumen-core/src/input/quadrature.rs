//! Quadrature decoding for the encoder interrupt
//!
//! Uses a state machine for reliable decoding with noise rejection. The
//! interrupt handler feeds pin levels in and records completed detents in
//! the [`super::RotaryCounter`].

/// Completed detent direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Cw,
    Ccw,
}

impl Rotation {
    /// Signed counter increment
    pub fn steps(self) -> i32 {
        match self {
            Rotation::Cw => 1,
            Rotation::Ccw => -1,
        }
    }
}

/// Decoder state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CwStep1,
    CwStep2,
    CcwStep1,
    CcwStep2,
}

/// Quadrature decoder
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: State,
    last_a: bool,
    last_b: bool,
}

impl QuadratureDecoder {
    /// Create a decoder from the current pin levels
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            state: State::Idle,
            last_a: a,
            last_b: b,
        }
    }

    /// Feed new pin levels
    ///
    /// Returns a rotation once a full detent has been traversed.
    ///
    /// Quadrature encoding:
    /// CW:  A leads B (A changes first when rotating clockwise)
    /// CCW: B leads A (B changes first when rotating counter-clockwise)
    ///
    /// Idle (1,1) -> CwStep1 (0,1) -> CwStep2 (0,0) -> Cw -> Idle
    /// Idle (1,1) -> CcwStep1 (1,0) -> CcwStep2 (0,0) -> Ccw -> Idle
    pub fn update(&mut self, a: bool, b: bool) -> Option<Rotation> {
        if a == self.last_a && b == self.last_b {
            return None;
        }
        self.last_a = a;
        self.last_b = b;

        match self.state {
            State::Idle => {
                if !a && b {
                    self.state = State::CwStep1;
                } else if a && !b {
                    self.state = State::CcwStep1;
                }
                None
            }
            State::CwStep1 | State::CcwStep1 => {
                if !a && !b {
                    self.state = if self.state == State::CwStep1 {
                        State::CwStep2
                    } else {
                        State::CcwStep2
                    };
                } else if a && b {
                    // Bounce
                    self.state = State::Idle;
                }
                None
            }
            State::CwStep2 | State::CcwStep2 => {
                if !(a || b) {
                    return None;
                }
                let rotation = if self.state == State::CwStep2 {
                    Rotation::Cw
                } else {
                    Rotation::Ccw
                };
                self.state = State::Idle;
                Some(rotation)
            }
        }
    }
}
