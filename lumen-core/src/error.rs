//! Error taxonomy shared by both nodes
//!
//! Nothing here is fatal. Every variant leaves the node able to keep
//! polling; the worst outcome is staying unpaired or running on defaults.

use lumen_hal::{FlashError, RadioError, StorageKey};
use lumen_protocol::{Command, MacAddress, WireError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Undersized or unknown datagram; dropped without retry
    Malformed(WireError),
    /// Well-formed datagram from an identity that is not registered
    UnauthorizedSender(MacAddress),
    /// New controller tried to pair but every slot is taken
    RegistryFull,
    /// Datagram not acknowledged after all send attempts
    SendFailure,
    /// Discovery exhausted every channel on every pass
    PairingTimeout,
    /// Persisted record failed validation
    StoreCorrupt(StorageKey),
    /// Command requested with no bound driver
    NotPaired,
    /// Command that makes no sense for the receiving node
    UnexpectedCommand(Command),
    /// Receive inbox full; datagram dropped
    InboxFull,
    Radio(RadioError),
    Storage(FlashError),
    /// Record did not fit its buffer or failed to deserialize
    Encoding,
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Error::Malformed(e)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Error::Radio(e)
    }
}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Error::Storage(e)
    }
}

impl From<postcard::Error> for Error {
    fn from(_: postcard::Error) -> Self {
        Error::Encoding
    }
}
