//! Node orchestrators
//!
//! Each node owns its collaborators and exposes a `start` / `poll` pair for
//! the firmware main loop. Interrupt and radio-callback context only ever
//! touch the shared [`crate::RotaryCounter`] and [`crate::Inbox`].

pub mod controller;
pub mod driver;

pub use controller::ControllerNode;
pub use driver::DriverNode;
