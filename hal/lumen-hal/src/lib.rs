//! Lumen Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the lamp logic consumes.
//! Board support code implements them on top of the actual radio stack,
//! flash partition, PWM timer and GPIO pins.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  lumen-core (controller / driver nodes) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lumen-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  radio stack  │       │  flash / PWM  │
//! │    (board)    │       │    (board)    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`radio::Radio`] - Connectionless datagram transport
//! - [`flash::FlashStorage`] - Persistent key-value storage
//! - [`pwm::LampOutput`] - Dual-channel LED output with fades
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
#[cfg(feature = "sequential-storage")]
pub mod nor;
pub mod pwm;
pub mod radio;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{InputPin, OutputPin};
pub use pwm::{LampOutput, LedChannel};
pub use radio::{Radio, RadioError};
