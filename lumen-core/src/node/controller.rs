//! Controller node: knob, button, status LED, one bound driver

use embedded_hal_async::delay::DelayNs;
use lumen_hal::{FlashStorage, OutputPin, Radio, StorageKey};
use lumen_protocol::{DataMessage, LampState, Message, Role};

use crate::command::{accepted_echo, CommandSender};
use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::inbox::{Inbox, Received, INBOX_DEPTH};
use crate::input::{intent_for, InputDetector, Intent, Mode, RotaryCounter};
use crate::pairing::{PairingSession, PairingState};
use crate::power::{indicator_level, IdleMonitor};
use crate::store::SessionStore;

/// Controller state and the hardware it drives
///
/// `inbox` is filled by the radio receive callback and `counter` by the
/// encoder interrupt; everything else is touched only from [`Self::poll`].
pub struct ControllerNode<'a, R, F, D, const N: usize = INBOX_DEPTH> {
    config: ControllerConfig,
    radio: R,
    store: SessionStore<F>,
    delay: D,
    inbox: &'a Inbox<N>,
    counter: &'a RotaryCounter,
    pairing: PairingSession,
    sender: CommandSender,
    detector: InputDetector,
    idle: IdleMonitor,
    lamp: LampState,
    consecutive_failures: u8,
}

impl<'a, R, F, D, const N: usize> ControllerNode<'a, R, F, D, N>
where
    R: Radio,
    F: FlashStorage,
    D: DelayNs,
{
    pub fn new(
        config: ControllerConfig,
        radio: R,
        flash: F,
        delay: D,
        inbox: &'a Inbox<N>,
        counter: &'a RotaryCounter,
        now_ms: u32,
    ) -> Self {
        Self {
            config,
            radio,
            store: SessionStore::new(flash),
            delay,
            inbox,
            counter,
            pairing: PairingSession::new(config.pairing),
            sender: CommandSender::new(config.send),
            detector: InputDetector::new(
                config.input.long_press_ms,
                config.input.extended_press_ms,
                counter.load(),
            ),
            idle: IdleMonitor::new(config.power, now_ms),
            lamp: LampState::default(),
            consecutive_failures: 0,
        }
    }

    /// Restore the saved lamp state and session, then fast-resume or scan
    pub async fn start(&mut self) -> PairingState {
        if let Some(saved) = self.store.load_lamp_state(StorageKey::LampState).await {
            self.lamp = saved;
        }
        let session = self.store.load_session().await;
        self.pairing.begin(session, &mut self.radio)
    }

    /// One pass of the main loop
    ///
    /// `pressed` is the debounced button level. Returns the outcome of the
    /// command sent this pass, if any; errors never stop the loop.
    pub async fn poll(&mut self, now_ms: u32, pressed: bool) -> Result<()> {
        while let Some(received) = self.inbox.try_take() {
            self.handle_received(received).await;
        }

        self.pairing.poll(now_ms, &mut self.radio);

        let event = self.detector.poll(now_ms, self.counter.load(), pressed);
        if self.detector.is_pressed() {
            // Holding counts as activity until the hold event fires
            self.idle.note_activity(now_ms);
        }
        let Some(event) = event else {
            return Ok(());
        };
        self.idle.note_activity(now_ms);
        debug!("input {}", event);

        match intent_for(event, &self.lamp, &self.config.input) {
            Some(intent) => self.execute(intent).await,
            None => Ok(()),
        }
    }

    async fn handle_received(&mut self, received: Received) {
        match received.message {
            Message::Pairing(message) => {
                if let Some(session) = self.pairing.on_response(&message, &mut self.radio) {
                    self.consecutive_failures = 0;
                    if let Err(e) = self.store.save_session(&session).await {
                        warn!("session not persisted: {}", e);
                    }
                }
            }
            Message::Data(message) => {
                let echo = accepted_echo(
                    self.pairing.peer(),
                    self.pairing.last_sequence(),
                    &message,
                );
                if let Some(state) = echo {
                    trace!("driver echo seq {}", message.sequence);
                    self.lamp = state;
                    self.consecutive_failures = 0;
                }
            }
        }
    }

    /// Carry out an intent: update the local view, then tell the driver
    ///
    /// The local state is not rolled back when the send fails.
    pub async fn execute(&mut self, intent: Intent) -> Result<()> {
        let Some((command, attached)) = intent.command(self.lamp) else {
            return self.reset_pairing().await;
        };
        self.lamp = intent.apply_local(self.lamp);

        let Some(peer) = self.pairing.peer() else {
            return Err(match self.pairing.state() {
                PairingState::Timeout => Error::PairingTimeout,
                _ => Error::NotPaired,
            });
        };
        let sequence = self.pairing.next_sequence();
        let message = DataMessage::new(
            Role::Controller,
            self.radio.address(),
            command,
            sequence,
            attached,
        );

        let result = self
            .sender
            .send(&mut self.radio, &mut self.delay, peer.peer, &message)
            .await;
        match result {
            Ok(()) => self.consecutive_failures = 0,
            Err(_) => self.note_send_failure(),
        }
        result
    }

    fn note_send_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let limit = self.config.rediscover_after_failures;
        if limit > 0 && self.consecutive_failures >= limit {
            warn!(
                "driver unreachable after {} commands, rediscovering",
                self.consecutive_failures
            );
            self.consecutive_failures = 0;
            self.pairing.rediscover(&mut self.radio);
        }
    }

    /// Forget the driver everywhere and scan from channel 1
    pub async fn reset_pairing(&mut self) -> Result<()> {
        info!("pairing reset");
        self.restart_pairing();
        self.store.clear_session().await
    }

    /// Restart discovery, e.g. after `Timeout`. Persisted data is kept.
    pub fn restart_pairing(&mut self) {
        self.pairing.reset(&mut self.radio);
        self.consecutive_failures = 0;
        self.pairing.begin(None, &mut self.radio);
    }

    /// Whether the node may sleep now
    ///
    /// Never while the button is held.
    pub fn should_sleep(&mut self, now_ms: u32) -> bool {
        if self.detector.is_pressed() {
            return false;
        }
        self.idle.should_sleep(now_ms, self.pairing.is_paired())
    }

    /// Persist what a wake-up needs
    pub async fn prepare_sleep(&mut self) -> Result<()> {
        self.store
            .save_lamp_state(StorageKey::LampState, &self.lamp)
            .await?;
        if let Some(session) = self.pairing.peer() {
            self.store.save_session(&session).await?;
        }
        Ok(())
    }

    pub fn update_indicator<P: OutputPin>(&self, now_ms: u32, pin: &mut P) {
        pin.set_state(indicator_level(self.pairing.is_paired(), now_ms));
    }

    pub fn lamp_state(&self) -> LampState {
        self.lamp
    }

    pub fn mode(&self) -> Mode {
        self.detector.mode()
    }

    pub fn pairing(&self) -> &PairingSession {
        &self.pairing
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
    pub fn release(self) -> (R, F, D) {
        (self.radio, self.store.into_inner(), self.delay)
    }
}
