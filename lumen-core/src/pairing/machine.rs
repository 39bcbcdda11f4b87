//! Pairing state machine definition
//!
//! Pure transition table. Side effects (tuning, broadcasting, persisting)
//! are performed by [`super::PairingSession`] around each transition.

/// Pairing states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairingState {
    /// Nothing attempted yet
    Init,
    /// Looking for a persisted session
    Checking,
    /// Discovery about to start on channel 1
    Scanning,
    /// Broadcast due on the current scan channel
    Requesting,
    /// Request sent, waiting for a driver reply
    Waiting,
    /// Bound to a driver
    Paired,
    /// Every channel failed on every pass; needs an explicit restart
    Timeout,
}

/// Inputs to the pairing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairingEvent {
    /// Pairing requested
    Start,
    /// A valid persisted session was applied
    SessionFound,
    /// No usable persisted session
    NoSession,
    /// Discovery broadcast went out
    RequestSent,
    /// No reply within the response timeout, more channels left
    ResponseTimeout,
    /// No reply on the last channel of the last pass
    ChannelsExhausted,
    /// Driver replied
    ResponseReceived,
    /// The bound driver stopped answering
    LinkLost,
    /// Forget pairing
    Reset,
}

impl PairingState {
    /// Whether a driver is bound
    pub fn is_paired(&self) -> bool {
        matches!(self, PairingState::Paired)
    }

    /// Whether discovery is in progress
    pub fn is_discovering(&self) -> bool {
        matches!(
            self,
            PairingState::Scanning | PairingState::Requesting | PairingState::Waiting
        )
    }

    /// Process an event and return the next state
    pub fn transition(self, event: PairingEvent) -> Self {
        use PairingEvent::*;
        use PairingState::*;

        match (self, event) {
            (_, Reset) => Init,

            (Init, Start) => Checking,

            (Checking, SessionFound) => Paired,
            (Checking, NoSession) => Scanning,

            (Scanning, RequestSent) => Waiting,
            (Requesting, RequestSent) => Waiting,

            (Waiting, ResponseReceived) => Paired,
            (Waiting, ResponseTimeout) => Requesting,
            (Waiting, ChannelsExhausted) => Timeout,

            (Paired, LinkLost) => Scanning,

            // Default: stay in current state
            _ => self,
        }
    }
}
