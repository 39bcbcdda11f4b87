//! Pairing session (controller side)
//!
//! Owns the discovery cursor and the bound peer. Driven from the main loop:
//! [`PairingSession::begin`] once, [`PairingSession::poll`] every pass, and
//! [`PairingSession::on_response`] for each staged pairing datagram.

use lumen_hal::Radio;
use lumen_protocol::{Channel, MacAddress, PairingMessage, Role};

use super::machine::{PairingEvent, PairingState};
use crate::config::PairingConfig;

/// A bound driver: payload identity and the channel it listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerSession {
    pub peer: MacAddress,
    pub channel: Channel,
}

impl PeerSession {
    /// Sanity check for records loaded from storage
    pub fn is_valid(&self) -> bool {
        self.peer.is_unicast() && self.channel.is_valid()
    }
}

/// Controller pairing context
#[derive(Debug, Clone)]
pub struct PairingSession {
    config: PairingConfig,
    state: PairingState,
    target: Option<PeerSession>,
    scan_channel: Channel,
    retry_count: u8,
    last_request_ms: u32,
    sequence: u8,
    resumed: bool,
}

impl PairingSession {
    pub fn new(config: PairingConfig) -> Self {
        Self {
            config,
            state: PairingState::Init,
            target: None,
            scan_channel: Channel::MIN,
            retry_count: 0,
            last_request_ms: 0,
            sequence: 0,
            resumed: false,
        }
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    pub fn is_paired(&self) -> bool {
        self.state.is_paired()
    }

    /// Bound driver, if any
    pub fn peer(&self) -> Option<PeerSession> {
        self.target.filter(|_| self.is_paired())
    }

    pub fn scan_channel(&self) -> Channel {
        self.scan_channel
    }

    /// Completed full passes over the channel range
    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Whether the current session came from storage without a handshake
    pub fn is_resumed(&self) -> bool {
        self.resumed && self.is_paired()
    }

    /// Stamp for the next outgoing command
    pub fn next_sequence(&mut self) -> u8 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Sequence of the last outgoing command
    pub fn last_sequence(&self) -> u8 {
        self.sequence
    }

    fn apply(&mut self, event: PairingEvent) {
        let next = self.state.transition(event);
        if next != self.state {
            trace!("pairing {} -> {}", self.state, next);
        }
        self.state = next;
    }

    /// Leave `Init`, fast-resuming `persisted` when it is usable
    ///
    /// Fast resume tunes the radio and registers the peer with no
    /// handshake. If the radio rejects either step, discovery starts
    /// instead.
    pub fn begin<R: Radio>(&mut self, persisted: Option<PeerSession>, radio: &mut R) -> PairingState {
        if self.state != PairingState::Init {
            return self.state;
        }
        self.apply(PairingEvent::Start);

        if let Some(session) = persisted.filter(PeerSession::is_valid) {
            let bound = radio
                .set_channel(session.channel)
                .and_then(|_| radio.add_peer(session.peer, session.channel));
            match bound {
                Ok(()) => {
                    info!(
                        "fast resume with {} on channel {}",
                        session.peer,
                        session.channel.number()
                    );
                    self.target = Some(session);
                    self.resumed = true;
                    self.apply(PairingEvent::SessionFound);
                    return self.state;
                }
                Err(e) => warn!("fast resume failed: {}", e),
            }
        }

        self.start_discovery();
        self.apply(PairingEvent::NoSession);
        self.state
    }

    fn start_discovery(&mut self) {
        self.target = None;
        self.resumed = false;
        self.scan_channel = Channel::MIN;
        self.retry_count = 0;
    }

    /// Advance discovery. Does nothing outside the discovery states.
    pub fn poll<R: Radio>(&mut self, now_ms: u32, radio: &mut R) -> PairingState {
        match self.state {
            PairingState::Scanning | PairingState::Requesting => {
                let request = PairingMessage::new(
                    Role::Controller,
                    radio.address(),
                    self.scan_channel,
                    now_ms,
                );
                debug!("pairing request on channel {}", self.scan_channel.number());
                if let Err(e) = radio.broadcast(self.scan_channel, &request.to_bytes()) {
                    // Treated like a missing reply; the timeout moves on
                    warn!("pairing broadcast failed: {}", e);
                }
                self.last_request_ms = now_ms;
                self.apply(PairingEvent::RequestSent);
            }
            PairingState::Waiting => {
                if now_ms.wrapping_sub(self.last_request_ms) >= self.config.response_timeout_ms {
                    self.advance_channel();
                }
            }
            PairingState::Init
            | PairingState::Checking
            | PairingState::Paired
            | PairingState::Timeout => {}
        }
        self.state
    }

    fn advance_channel(&mut self) {
        if let Some(next) = self.scan_channel.next() {
            self.scan_channel = next;
            self.apply(PairingEvent::ResponseTimeout);
            return;
        }

        self.scan_channel = Channel::MIN;
        self.retry_count = self.retry_count.saturating_add(1);
        if self.retry_count >= self.config.max_passes {
            error!("pairing timed out after {} passes", self.retry_count);
            self.apply(PairingEvent::ChannelsExhausted);
        } else {
            debug!("pairing pass {} complete", self.retry_count);
            self.apply(PairingEvent::ResponseTimeout);
        }
    }

    /// Handle a staged pairing datagram
    ///
    /// Only the first driver reply received while `Waiting` binds the
    /// session. The payload identity and channel are used, never the
    /// radio's source address. Returns the new session for persisting.
    pub fn on_response<R: Radio>(
        &mut self,
        message: &PairingMessage,
        radio: &mut R,
    ) -> Option<PeerSession> {
        if message.role != Role::Driver || !message.identity.is_unicast() {
            return None;
        }
        if self.state != PairingState::Waiting {
            debug!("ignoring pairing reply from {} in {}", message.identity, self.state);
            return None;
        }

        let session = PeerSession {
            peer: message.identity,
            channel: message.channel,
        };
        let bound = radio
            .set_channel(session.channel)
            .and_then(|_| radio.add_peer(session.peer, session.channel));
        if let Err(e) = bound {
            warn!("cannot bind {}: {}", session.peer, e);
            return None;
        }

        info!(
            "paired with {} on channel {}",
            session.peer,
            session.channel.number()
        );
        self.target = Some(session);
        self.resumed = false;
        self.apply(PairingEvent::ResponseReceived);
        Some(session)
    }

    /// Forget the bound driver and return to `Init`
    pub fn reset<R: Radio>(&mut self, radio: &mut R) {
        if let Some(session) = self.target.take() {
            radio.remove_peer(session.peer);
        }
        self.start_discovery();
        self.sequence = 0;
        self.last_request_ms = 0;
        self.apply(PairingEvent::Reset);
    }

    /// Drop a bound session that stopped answering and scan again
    pub fn rediscover<R: Radio>(&mut self, radio: &mut R) {
        if !self.is_paired() {
            return;
        }
        if let Some(session) = self.target {
            radio.remove_peer(session.peer);
        }
        self.start_discovery();
        self.apply(PairingEvent::LinkLost);
    }
}
