//! Lumen Radio Protocol
//!
//! This crate defines the datagrams exchanged between the controller (rotary
//! knob) and the driver (LED lamp) over a connectionless radio link. Every
//! datagram is a fixed-size little-endian record with no padding.
//!
//! # Records
//!
//! ```text
//! Pairing (13 bytes)
//! ┌──────┬──────┬──────────┬─────────┬───────────┐
//! │ TYPE │ ROLE │ IDENTITY │ CHANNEL │ TIMESTAMP │
//! │ 1B=0 │ 1B   │ 6B       │ 1B      │ 4B        │
//! └──────┴──────┴──────────┴─────────┴───────────┘
//!
//! Data (17 bytes)
//! ┌──────┬──────┬──────────┬─────────┬─────┬───────┬────────────┬─────────┐
//! │ TYPE │ ROLE │ IDENTITY │ COMMAND │ SEQ │ IS_ON │ BRIGHTNESS │ BALANCE │
//! │ 1B=1 │ 1B   │ 6B       │ 1B      │ 1B  │ 1B    │ 2B u16     │ 4B f32  │
//! └──────┴──────┴──────────┴─────────┴─────┴───────┴────────────┴─────────┘
//! ```
//!
//! The identity inside the payload is the sender's real hardware address.
//! The source address reported by the radio may be randomized for broadcast
//! traffic, so receivers always match on the payload identity.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod address;
pub mod lamp;
pub mod messages;

pub use address::{Channel, MacAddress};
pub use lamp::{Duties, LampState, MAX_DUTY};
pub use messages::{
    Command, DataMessage, Message, PairingMessage, Role, WireError, MAX_MESSAGE_SIZE,
};
