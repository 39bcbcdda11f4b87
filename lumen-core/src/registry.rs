//! Paired controller registry (driver side)
//!
//! Fixed number of slots, unique by payload identity. Entries are created
//! by a successful pairing handshake and stay until explicitly removed.
//! There is no eviction: a full registry rejects new identities.

use heapless::Vec;
use lumen_protocol::{Channel, MacAddress};
use serde::{Deserialize, Serialize};

use crate::config::MAX_CONTROLLERS;
use crate::error::{Error, Result};

/// One registry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerEntry {
    pub identity: MacAddress,
    pub channel: Channel,
    pub active: bool,
}

impl PeerEntry {
    const EMPTY: PeerEntry = PeerEntry {
        identity: MacAddress::ZERO,
        channel: Channel::MIN,
        active: false,
    };
}

/// Outcome of a successful [`PeerRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Registration {
    /// New identity took a free slot
    Registered,
    /// Known identity, channel updated in place
    Updated,
}

/// Persisted form of an active slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub identity: MacAddress,
    pub channel: Channel,
}

/// Fixed-capacity set of authorized controllers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRegistry<const N: usize = MAX_CONTROLLERS> {
    entries: [PeerEntry; N],
}

impl<const N: usize> Default for PeerRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PeerRegistry<N> {
    pub const fn new() -> Self {
        Self {
            entries: [PeerEntry::EMPTY; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether `identity` is an authorized controller
    pub fn contains(&self, identity: &MacAddress) -> bool {
        self.get(identity).is_some()
    }

    pub fn get(&self, identity: &MacAddress) -> Option<&PeerEntry> {
        self.iter().find(|entry| entry.identity == *identity)
    }

    /// Add `identity` or refresh its channel
    ///
    /// Fails with [`Error::RegistryFull`] only for a new identity with no
    /// free slot left.
    pub fn register(&mut self, identity: MacAddress, channel: Channel) -> Result<Registration> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.active && entry.identity == identity)
        {
            entry.channel = channel;
            return Ok(Registration::Updated);
        }

        let slot = self
            .entries
            .iter_mut()
            .find(|entry| !entry.active)
            .ok_or(Error::RegistryFull)?;
        *slot = PeerEntry {
            identity,
            channel,
            active: true,
        };
        Ok(Registration::Registered)
    }

    /// Free the slot held by `identity`. Returns whether it was present.
    pub fn remove(&mut self, identity: &MacAddress) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.active && entry.identity == *identity)
        {
            Some(entry) => {
                *entry = PeerEntry::EMPTY;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries = [PeerEntry::EMPTY; N];
    }

    /// Active entries
    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.entries.iter().filter(|entry| entry.active)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    pub fn to_records(&self) -> Vec<PeerRecord, N> {
        self.iter()
            .map(|entry| PeerRecord {
                identity: entry.identity,
                channel: entry.channel,
            })
            .collect()
    }

    /// Rebuild from persisted records, skipping invalid or duplicate ones
    pub fn from_records(records: &[PeerRecord]) -> Self {
        let mut registry = Self::new();
        for record in records {
            if record.identity.is_unicast() && record.channel.is_valid() {
                let _ = registry.register(record.identity, record.channel);
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0x24, 0x6F, 0x28, 0, 0, last])
    }

    fn channel(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    #[test]
    fn test_register_and_contains() {
        let mut registry = PeerRegistry::<3>::new();
        assert!(!registry.contains(&mac(1)));
        assert_eq!(registry.register(mac(1), channel(1)), Ok(Registration::Registered));
        assert!(registry.contains(&mac(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregister_updates_channel() {
        let mut registry = PeerRegistry::<3>::new();
        registry.register(mac(1), channel(1)).unwrap();
        assert_eq!(registry.register(mac(1), channel(9)), Ok(Registration::Updated));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&mac(1)).unwrap().channel, channel(9));
    }

    #[test]
    fn test_full_registry() {
        let mut registry = PeerRegistry::<3>::new();
        for i in 1..=3 {
            registry.register(mac(i), channel(1)).unwrap();
        }
        assert!(registry.is_full());
        assert_eq!(registry.register(mac(4), channel(1)), Err(Error::RegistryFull));
        // Known identities still update when full
        assert_eq!(registry.register(mac(2), channel(5)), Ok(Registration::Updated));
    }

    #[test]
    fn test_remove_frees_slot() {
        let mut registry = PeerRegistry::<2>::new();
        registry.register(mac(1), channel(1)).unwrap();
        registry.register(mac(2), channel(1)).unwrap();
        assert!(registry.remove(&mac(1)));
        assert!(!registry.remove(&mac(1)));
        assert_eq!(registry.register(mac(3), channel(2)), Ok(Registration::Registered));
        assert!(!registry.contains(&mac(1)));
    }

    #[test]
    fn test_clear() {
        let mut registry = PeerRegistry::<3>::new();
        registry.register(mac(1), channel(1)).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_records_roundtrip_skips_invalid() {
        let mut registry = PeerRegistry::<3>::new();
        registry.register(mac(1), channel(3)).unwrap();
        registry.register(mac(2), channel(7)).unwrap();

        let mut records = registry.to_records();
        records
            .push(PeerRecord {
                identity: MacAddress::ZERO,
                channel: channel(1),
            })
            .unwrap();

        let restored = PeerRegistry::<3>::from_records(&records);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(&mac(2)).unwrap().channel, channel(7));
    }

    proptest! {
        #[test]
        fn prop_duplicate_registration_never_grows(ids in proptest::collection::vec(0u8..6, 1..20)) {
            let mut registry = PeerRegistry::<3>::new();
            for id in ids {
                let before = registry.len();
                let known = registry.contains(&mac(id));
                match registry.register(mac(id), channel(1)) {
                    Ok(Registration::Updated) => {
                        prop_assert!(known);
                        prop_assert_eq!(registry.len(), before);
                    }
                    Ok(Registration::Registered) => {
                        prop_assert!(!known);
                        prop_assert_eq!(registry.len(), before + 1);
                    }
                    Err(e) => {
                        prop_assert_eq!(e, Error::RegistryFull);
                        prop_assert!(!known);
                        prop_assert_eq!(before, 3);
                    }
                }
            }
        }

        #[test]
        fn prop_capacity_plus_one_is_full(start in 0u8..200) {
            let mut registry = PeerRegistry::<3>::new();
            for i in 0..3 {
                prop_assert!(registry.register(mac(start + i), channel(1)).is_ok());
            }
            prop_assert_eq!(registry.register(mac(start + 3), channel(1)), Err(Error::RegistryFull));
        }
    }
}
