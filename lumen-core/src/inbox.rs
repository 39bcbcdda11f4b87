//! Receive staging between the radio callback and the main loop
//!
//! The radio stack delivers datagrams on its own context. The callback
//! decodes (cheap, bounded) and stages the result here; the loop drains it
//! on its next pass. Nothing else crosses the boundary.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use lumen_protocol::{MacAddress, Message};
use portable_atomic::{AtomicU32, Ordering};

use crate::error::{Error, Result};

/// Default inbox depth
pub const INBOX_DEPTH: usize = 8;

/// A decoded datagram waiting for the main loop
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Received {
    /// Source address reported by the radio. Informational only; may be
    /// randomized for broadcast traffic.
    pub source_hint: MacAddress,
    pub message: Message,
}

/// Bounded queue of decoded datagrams
pub struct Inbox<const N: usize = INBOX_DEPTH> {
    queue: Channel<CriticalSectionRawMutex, Received, N>,
    dropped: AtomicU32,
}

impl<const N: usize> Default for Inbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Inbox<N> {
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Radio receive callback. Never blocks.
    ///
    /// Malformed datagrams and datagrams arriving while the inbox is full
    /// are dropped.
    pub fn on_receive(&self, source_hint: MacAddress, data: &[u8]) -> Result<()> {
        let message = match Message::decode(data) {
            Ok(message) => message,
            Err(e) => {
                debug!("dropping malformed datagram from {}: {}", source_hint, e);
                return Err(e.into());
            }
        };

        self.queue
            .try_send(Received {
                source_hint,
                message,
            })
            .map_err(|_| {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Error::InboxFull
            })
    }

    /// Next staged datagram, if any
    pub fn try_take(&self) -> Option<Received> {
        self.queue.try_receive().ok()
    }

    /// Datagrams lost to a full inbox since start
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}
