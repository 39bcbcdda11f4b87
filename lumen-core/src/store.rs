//! Session persistence
//!
//! Narrow typed layer over the key-value [`FlashStorage`]: records are
//! postcard-encoded and validated on load. A record that fails validation
//! counts as [`Error::StoreCorrupt`] and is treated as absent, so the node
//! falls back to discovery or default lamp settings.

use heapless::Vec;
use lumen_hal::{FlashError, FlashStorage, StorageKey};
use lumen_protocol::{Channel, LampState, MacAddress};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::pairing::PeerSession;
use crate::registry::{PeerRecord, PeerRegistry};

/// Largest encoded record
const RECORD_SIZE: usize = 64;

pub struct SessionStore<F> {
    flash: F,
}

impl<F: FlashStorage> SessionStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Load and decode a record; `None` if it was never written
    pub async fn load<T: DeserializeOwned>(&mut self, key: StorageKey) -> Result<Option<T>> {
        let mut buffer = [0u8; RECORD_SIZE];
        let len = match self.flash.read(key, &mut buffer).await {
            Ok(len) => len,
            Err(FlashError::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        postcard::from_bytes(&buffer[..len])
            .map(Some)
            .map_err(|_| Error::StoreCorrupt(key))
    }

    pub async fn save<T: Serialize>(&mut self, key: StorageKey, value: &T) -> Result<()> {
        let mut buffer = [0u8; RECORD_SIZE];
        let encoded = postcard::to_slice(value, &mut buffer)?;
        self.flash.write(key, encoded).await?;
        Ok(())
    }

    /// Persisted driver binding, validated
    ///
    /// `Ok(None)` when no session was ever saved or it was cleared.
    pub async fn try_load_session(&mut self) -> Result<Option<PeerSession>> {
        let paired: Option<bool> = self.load(StorageKey::Paired).await?;
        if paired != Some(true) {
            return Ok(None);
        }

        let peer: MacAddress = self
            .load(StorageKey::PeerAddress)
            .await?
            .ok_or(Error::StoreCorrupt(StorageKey::PeerAddress))?;
        if !peer.is_unicast() {
            return Err(Error::StoreCorrupt(StorageKey::PeerAddress));
        }

        let channel: Channel = self
            .load(StorageKey::PeerChannel)
            .await?
            .ok_or(Error::StoreCorrupt(StorageKey::PeerChannel))?;
        if !channel.is_valid() {
            return Err(Error::StoreCorrupt(StorageKey::PeerChannel));
        }

        Ok(Some(PeerSession { peer, channel }))
    }

    /// Persisted driver binding, or `None` if absent or unusable
    pub async fn load_session(&mut self) -> Option<PeerSession> {
        self.try_load_session()
            .await
            .unwrap_or_else(|e| absent("session", e))
    }

    pub async fn save_session(&mut self, session: &PeerSession) -> Result<()> {
        self.save(StorageKey::PeerAddress, &session.peer).await?;
        self.save(StorageKey::PeerChannel, &session.channel).await?;
        // Flag last so a torn write never leaves a half session marked valid
        self.save(StorageKey::Paired, &true).await
    }

    /// Forget the driver binding
    pub async fn clear_session(&mut self) -> Result<()> {
        self.save(StorageKey::Paired, &false).await
    }

    /// Lamp record under `key`, validated
    pub async fn try_load_lamp_state(&mut self, key: StorageKey) -> Result<Option<LampState>> {
        match self.load::<LampState>(key).await? {
            Some(state) if !state.is_valid() => Err(Error::StoreCorrupt(key)),
            other => Ok(other),
        }
    }

    /// Lamp record under `key`, or `None` if absent or out of range
    pub async fn load_lamp_state(&mut self, key: StorageKey) -> Option<LampState> {
        self.try_load_lamp_state(key)
            .await
            .unwrap_or_else(|e| absent("lamp state", e))
    }

    pub async fn save_lamp_state(&mut self, key: StorageKey, state: &LampState) -> Result<()> {
        self.save(key, state).await
    }

    /// Paired controllers, empty if absent or unreadable
    pub async fn load_registry<const N: usize>(&mut self) -> PeerRegistry<N> {
        match self.load::<Vec<PeerRecord, N>>(StorageKey::Controllers).await {
            Ok(Some(records)) => PeerRegistry::from_records(&records),
            Ok(None) => PeerRegistry::new(),
            Err(e) => absent("registry", e).unwrap_or_default(),
        }
    }

    pub async fn save_registry<const N: usize>(&mut self, registry: &PeerRegistry<N>) -> Result<()> {
        self.save(StorageKey::Controllers, &registry.to_records()).await
    }
}

fn absent<T>(what: &str, error: Error) -> Option<T> {
    warn!("discarding stored {}: {}", what, error);
    None
}
