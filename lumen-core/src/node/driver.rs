//! Driver node: LED outputs and the paired controller registry

use embedded_hal_async::delay::DelayNs;
use lumen_hal::{FlashStorage, LampOutput, Radio, StorageKey};
use lumen_protocol::{Command, DataMessage, Message, PairingMessage, Role};

use crate::command::{handle_command, send_with_retry, state_response};
use crate::config::{DriverConfig, MAX_CONTROLLERS};
use crate::error::{Error, Result};
use crate::inbox::{Inbox, Received, INBOX_DEPTH};
use crate::lamp::LampController;
use crate::registry::{PeerRegistry, Registration};
use crate::store::SessionStore;

/// Driver state and the hardware it drives
pub struct DriverNode<'a, R, F, D, O, const C: usize = MAX_CONTROLLERS, const N: usize = INBOX_DEPTH> {
    config: DriverConfig,
    radio: R,
    store: SessionStore<F>,
    delay: D,
    inbox: &'a Inbox<N>,
    lamp: LampController<O>,
    registry: PeerRegistry<C>,
}

impl<'a, R, F, D, O, const C: usize, const N: usize> DriverNode<'a, R, F, D, O, C, N>
where
    R: Radio,
    F: FlashStorage,
    D: DelayNs,
    O: LampOutput,
{
    pub fn new(
        config: DriverConfig,
        radio: R,
        flash: F,
        delay: D,
        output: O,
        inbox: &'a Inbox<N>,
    ) -> Self {
        Self {
            config,
            radio,
            store: SessionStore::new(flash),
            delay,
            inbox,
            lamp: LampController::new(output, config.lamp),
            registry: PeerRegistry::new(),
        }
    }

    /// Restore paired controllers and the saved lamp settings
    pub async fn start(&mut self) {
        self.registry = self.store.load_registry().await;
        for entry in self.registry.iter() {
            if let Err(e) = self.radio.add_peer(entry.identity, entry.channel) {
                warn!("cannot restore peer {}: {}", entry.identity, e);
            }
        }
        info!("driver up with {} paired controllers", self.registry.len());

        if let Some(saved) = self.store.load_lamp_state(StorageKey::LastOnState).await {
            self.lamp.restore_last_on(saved);
        }
    }

    /// Drain the inbox. Returns how many datagrams were handled.
    pub async fn poll(&mut self, now_ms: u32) -> usize {
        let mut handled = 0;
        while let Some(received) = self.inbox.try_take() {
            let source = received.source_hint;
            if let Err(e) = self.handle(received, now_ms).await {
                debug!("datagram via {} not handled: {}", source, e);
            }
            handled += 1;
        }
        handled
    }

    /// Handle one staged datagram
    pub async fn handle(&mut self, received: Received, now_ms: u32) -> Result<()> {
        match received.message {
            Message::Pairing(message) if message.role == Role::Controller => {
                self.pair_controller(&message, now_ms).await
            }
            Message::Pairing(_) => Ok(()),
            Message::Data(message) => self.handle_data(&message).await,
        }
    }

    /// Register a requesting controller and answer with our identity
    ///
    /// A full registry means no answer at all.
    async fn pair_controller(&mut self, request: &PairingMessage, now_ms: u32) -> Result<()> {
        if !request.identity.is_unicast() {
            return Err(Error::UnauthorizedSender(request.identity));
        }

        let previous = self.registry.get(&request.identity).map(|entry| entry.channel);
        if previous.is_none() && self.registry.is_full() {
            error!("registry full, not answering {}", request.identity);
            return Err(Error::RegistryFull);
        }
        // Radio peer first so a refused peer is never authorized
        if let Err(e) = self.radio.add_peer(request.identity, request.channel) {
            warn!("cannot add peer {}: {}", request.identity, e);
            return Err(e.into());
        }
        let registration = self.registry.register(request.identity, request.channel)?;

        if registration == Registration::Registered || previous != Some(request.channel) {
            info!(
                "controller {} registered on channel {}",
                request.identity,
                request.channel.number()
            );
            if let Err(e) = self.store.save_registry(&self.registry).await {
                warn!("registry not persisted: {}", e);
            }
        }

        let reply = PairingMessage::new(
            Role::Driver,
            self.radio.address(),
            self.radio.channel(),
            now_ms,
        );
        send_with_retry(
            &mut self.radio,
            &mut self.delay,
            request.identity,
            &reply.to_bytes(),
            self.config.reply_attempts,
            self.config.reply_delay_ms,
        )
        .await
    }

    async fn handle_data(&mut self, message: &DataMessage) -> Result<()> {
        let state = handle_command(&self.registry, &mut self.lamp, message)?;

        if message.command == Command::PowerOff {
            let saved = self.lamp.last_on();
            if let Err(e) = self
                .store
                .save_lamp_state(StorageKey::LastOnState, &saved)
                .await
            {
                warn!("saved state not persisted: {}", e);
            }
        }

        let echo = state_response(self.radio.address(), message.sequence, state);
        send_with_retry(
            &mut self.radio,
            &mut self.delay,
            message.identity,
            &echo.to_bytes(),
            self.config.response.max_attempts,
            self.config.response.retry_delay_ms,
        )
        .await
    }

    /// Drop every paired controller
    pub async fn forget_controllers(&mut self) -> Result<()> {
        for entry in self.registry.iter() {
            self.radio.remove_peer(entry.identity);
        }
        self.registry.clear();
        self.store.save_registry(&self.registry).await
    }

    pub fn lamp(&self) -> &LampController<O> {
        &self.lamp
    }

    pub fn registry(&self) -> &PeerRegistry<C> {
        &self.registry
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn store_mut(&mut self) -> &mut SessionStore<F> {
        &mut self.store
    }

    /// Give back the owned hardware
    pub fn release(self) -> (R, F, D, O) {
        (self.radio, self.store.into_inner(), self.delay, self.lamp.into_output())
    }
}
