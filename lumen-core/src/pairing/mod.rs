//! Controller pairing
//!
//! Binds the controller to exactly one driver, either by replaying a
//! persisted session (fast resume) or by channel-scanning discovery.

pub mod machine;
pub mod session;

pub use machine::{PairingEvent, PairingState};
pub use session::{PairingSession, PeerSession};
