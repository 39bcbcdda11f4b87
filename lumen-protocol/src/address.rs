//! Node identities and radio channels

use core::fmt;

/// 6-byte hardware address identifying a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Length of an address on the wire
    pub const LEN: usize = 6;

    /// All-ones address, used only for pairing discovery
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);

    /// All-zero address, never a valid peer
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Whether this address can name a unicast peer
    pub fn is_unicast(&self) -> bool {
        !self.is_zero() && !self.is_broadcast()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Radio channel in the 2.4 GHz band (1..=13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel(u8);

impl Channel {
    pub const MIN: Channel = Channel(1);
    pub const MAX: Channel = Channel(13);

    /// Create a channel, rejecting numbers outside 1..=13
    pub const fn new(number: u8) -> Option<Self> {
        if number >= Self::MIN.0 && number <= Self::MAX.0 {
            Some(Self(number))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// Next channel in scan order, or `None` after the last one
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0.saturating_add(1))
    }

    /// Whether the value is in range. Deserialized channels bypass [`Channel::new`].
    pub const fn is_valid(self) -> bool {
        Self::new(self.0).is_some()
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::MIN
    }
}
