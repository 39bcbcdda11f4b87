//! Rotary encoder and push button input
//!
//! The encoder interrupt only bumps a [`RotaryCounter`]. The main loop
//! samples the counter and a debounced [`Button`], feeds both into the
//! [`InputDetector`], and turns the resulting events into lamp intents
//! with [`intent_for`].

pub mod button;
pub mod counter;
pub mod detector;
pub mod policy;
pub mod quadrature;

pub use button::{Button, Debouncer};
pub use counter::RotaryCounter;
pub use detector::{InputDetector, InputEvent, Mode};
pub use policy::{intent_for, Intent};
pub use quadrature::{QuadratureDecoder, Rotation};
