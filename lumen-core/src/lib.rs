//! Board-agnostic logic for the Lumen lamp firmware
//!
//! Everything here runs against the traits in `lumen-hal`, so the same code
//! drives the real radio and flash on target and the in-memory doubles in
//! the host test suite:
//!
//! - Pairing state machine and fast resume (controller)
//! - Controller registry with a fixed number of slots (driver)
//! - Command handling, sequence numbers and bounded retries
//! - Rotary encoder and button input detection
//! - Session persistence with validation
//! - Node orchestrators tying the above into a main loop

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod command;
pub mod config;
pub mod error;
pub mod inbox;
pub mod input;
pub mod lamp;
pub mod node;
pub mod pairing;
pub mod power;
pub mod registry;
pub mod store;

#[cfg(test)]
mod mock;

pub use config::{ControllerConfig, DriverConfig};
pub use error::{Error, Result};
pub use inbox::{Inbox, Received};
pub use input::{InputEvent, Intent, RotaryCounter};
pub use lamp::LampController;
pub use node::{ControllerNode, DriverNode};
pub use pairing::{PairingSession, PairingState, PeerSession};
pub use registry::PeerRegistry;
pub use store::SessionStore;
