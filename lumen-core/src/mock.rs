//! Test doubles for the hardware traits

use std::collections::BTreeMap;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use lumen_hal::{
    FlashError, FlashStorage, InputPin, LampOutput, LedChannel, OutputPin, Radio, RadioError,
    StorageKey,
};
use lumen_protocol::{Channel, MacAddress, Message};

pub const CONTROLLER_MAC: MacAddress = MacAddress::new([0x24, 0x6F, 0x28, 0x11, 0x22, 0x33]);
pub const DRIVER_MAC: MacAddress = MacAddress::new([0x30, 0xAE, 0xA4, 0x44, 0x55, 0x66]);

/// A datagram handed to the radio
#[derive(Debug, Clone)]
pub struct Sent {
    pub to: MacAddress,
    pub channel: Channel,
    pub bytes: Vec<u8>,
}

impl Sent {
    pub fn message(&self) -> Message {
        Message::decode(&self.bytes).unwrap()
    }
}

/// Radio that records everything and fails on demand
#[derive(Debug)]
pub struct MockRadio {
    pub address: MacAddress,
    pub channel: Channel,
    pub peers: Vec<(MacAddress, Channel)>,
    pub peer_capacity: usize,
    pub sent: Vec<Sent>,
    /// Upcoming unicast sends that fail before delivery resumes
    pub fail_sends: u32,
    /// Every unicast send fails
    pub unreachable: bool,
    pub send_attempts: u32,
}

impl MockRadio {
    pub fn new(address: MacAddress) -> Self {
        Self {
            address,
            channel: Channel::MIN,
            peers: Vec::new(),
            peer_capacity: 20,
            sent: Vec::new(),
            fail_sends: 0,
            unreachable: false,
            send_attempts: 0,
        }
    }

    pub fn has_peer(&self, peer: MacAddress) -> bool {
        self.peers.iter().any(|(p, _)| *p == peer)
    }

    pub fn broadcast_count(&self) -> usize {
        self.sent
            .iter()
            .filter(|s| s.to == MacAddress::BROADCAST)
            .count()
    }

    pub fn take_sent(&mut self) -> Vec<Sent> {
        std::mem::take(&mut self.sent)
    }
}

impl Radio for MockRadio {
    fn address(&self) -> MacAddress {
        self.address
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    fn set_channel(&mut self, channel: Channel) -> Result<(), RadioError> {
        self.channel = channel;
        Ok(())
    }

    fn add_peer(&mut self, peer: MacAddress, channel: Channel) -> Result<(), RadioError> {
        if let Some(entry) = self.peers.iter_mut().find(|(p, _)| *p == peer) {
            entry.1 = channel;
            return Ok(());
        }
        if self.peers.len() >= self.peer_capacity {
            return Err(RadioError::PeerTableFull);
        }
        self.peers.push((peer, channel));
        Ok(())
    }

    fn remove_peer(&mut self, peer: MacAddress) {
        self.peers.retain(|(p, _)| *p != peer);
    }

    fn send(&mut self, peer: MacAddress, data: &[u8]) -> Result<(), RadioError> {
        let channel = if peer.is_broadcast() {
            self.channel
        } else {
            self.send_attempts += 1;
            let channel = self
                .peers
                .iter()
                .find(|(p, _)| *p == peer)
                .map(|(_, c)| *c)
                .ok_or(RadioError::SendFailed)?;
            if self.unreachable {
                return Err(RadioError::SendFailed);
            }
            if self.fail_sends > 0 {
                self.fail_sends -= 1;
                return Err(RadioError::SendFailed);
            }
            channel
        };
        self.sent.push(Sent {
            to: peer,
            channel,
            bytes: data.to_vec(),
        });
        Ok(())
    }
}

/// Key-value store kept in memory
#[derive(Debug, Default)]
pub struct MemoryFlash {
    pub records: BTreeMap<u8, Vec<u8>>,
    pub fail_writes: bool,
    pub writes: u32,
}

impl MemoryFlash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_raw(&mut self, key: StorageKey, bytes: &[u8]) {
        self.records.insert(key.as_u8(), bytes.to_vec());
    }
}

impl FlashStorage for MemoryFlash {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let data = self.records.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
        if buffer.len() < data.len() {
            return Err(FlashError::BufferTooSmall);
        }
        buffer[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Flash);
        }
        self.writes += 1;
        self.records.insert(key.as_u8(), data.to_vec());
        Ok(())
    }

    async fn exists(&mut self, key: StorageKey) -> bool {
        self.records.contains_key(&key.as_u8())
    }

    async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.records.clear();
        Ok(())
    }
}

/// PWM output that remembers the last target of each channel
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub fades: Vec<(LedChannel, u16, u32)>,
}

impl RecordingOutput {
    pub fn duty(&self, channel: LedChannel) -> u16 {
        self.fades
            .iter()
            .rev()
            .find(|(c, _, _)| *c == channel)
            .map(|(_, duty, _)| *duty)
            .unwrap_or(0)
    }
}

impl LampOutput for RecordingOutput {
    fn fade(&mut self, channel: LedChannel, duty: u16, duration_ms: u32) {
        self.fades.push((channel, duty, duration_ms));
    }
}

/// Delay that returns immediately and sums what was requested
#[derive(Debug, Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl NoDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Pin with a settable level
#[derive(Debug, Default)]
pub struct FakePin {
    pub high: bool,
}

impl InputPin for FakePin {
    fn is_high(&self) -> bool {
        self.high
    }
}

impl OutputPin for FakePin {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }
}
