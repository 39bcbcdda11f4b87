//! Connectionless datagram radio
//!
//! Models an ESP-NOW style link: unicast to registered peers, broadcast to
//! [`MacAddress::BROADCAST`], per-peer channel selection. Inbound datagrams
//! arrive through a callback owned by the board support code, which hands
//! them to the core's receive inbox.

use lumen_protocol::{Channel, MacAddress};

/// Errors reported by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// The datagram was not acknowledged by the peer
    SendFailed,
    /// The radio refused the requested channel
    InvalidChannel,
    /// No room left in the radio's own peer table
    PeerTableFull,
    /// The radio stack is not running
    NotInitialized,
}

/// Datagram transport used by both nodes
///
/// `send` is synchronous from the caller's point of view and reports
/// whether the link layer acknowledged the datagram.
pub trait Radio {
    /// Hardware address of this node
    fn address(&self) -> MacAddress;

    /// Channel the radio is currently tuned to
    fn channel(&self) -> Channel;

    /// Retune the radio
    fn set_channel(&mut self, channel: Channel) -> Result<(), RadioError>;

    /// Register a unicast peer reachable on `channel`
    ///
    /// Registering an existing peer updates its channel.
    fn add_peer(&mut self, peer: MacAddress, channel: Channel) -> Result<(), RadioError>;

    /// Drop a unicast peer. Unknown peers are ignored.
    fn remove_peer(&mut self, peer: MacAddress);

    /// Send a datagram to a registered peer
    fn send(&mut self, peer: MacAddress, data: &[u8]) -> Result<(), RadioError>;

    /// Tune to `channel` and send a datagram to the broadcast address
    fn broadcast(&mut self, channel: Channel, data: &[u8]) -> Result<(), RadioError> {
        self.set_channel(channel)?;
        self.send(MacAddress::BROADCAST, data)
    }
}
