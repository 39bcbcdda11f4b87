//! Command protocol handling
//!
//! Driver side: authorize the payload identity, apply the command to the
//! lamp, and build the state echo. Controller side: bounded-retry unicast
//! and echo acceptance.

use embedded_hal_async::delay::DelayNs;
use lumen_hal::{LampOutput, Radio};
use lumen_protocol::{Command, DataMessage, LampState, MacAddress, Role};

use crate::config::SendConfig;
use crate::error::{Error, Result};
use crate::lamp::LampController;
use crate::pairing::PeerSession;
use crate::registry::PeerRegistry;

/// Apply a controller command on the driver
///
/// Returns the lamp state to echo back. Unregistered identities are
/// rejected before anything is touched.
pub fn handle_command<O: LampOutput, const N: usize>(
    registry: &PeerRegistry<N>,
    lamp: &mut LampController<O>,
    message: &DataMessage,
) -> Result<LampState> {
    if !registry.contains(&message.identity) {
        warn!("unauthorized {} from {}", message.command, message.identity);
        return Err(Error::UnauthorizedSender(message.identity));
    }

    match message.command {
        Command::PowerOn => {
            let attached = (!message.lamp_state.is_unset()).then_some(message.lamp_state);
            lamp.power_on(attached);
        }
        Command::PowerOff => lamp.power_off(),
        Command::SetState => lamp.set_state(message.lamp_state),
        Command::StateResponse => return Err(Error::UnexpectedCommand(message.command)),
    }

    Ok(lamp.state())
}

/// Driver echo for the command stamped `sequence`
pub fn state_response(identity: MacAddress, sequence: u8, state: LampState) -> DataMessage {
    DataMessage::new(Role::Driver, identity, Command::StateResponse, sequence, state)
}

/// Echo the controller should adopt, if `message` is one
///
/// Only the bound driver's reply to the most recent command counts, so an
/// echo overtaken by a newer command is dropped.
pub fn accepted_echo(
    peer: Option<PeerSession>,
    last_sequence: u8,
    message: &DataMessage,
) -> Option<LampState> {
    let peer = peer?;
    if message.command != Command::StateResponse
        || message.role != Role::Driver
        || message.identity != peer.peer
    {
        return None;
    }
    if message.sequence != last_sequence {
        debug!(
            "stale echo seq {} (last sent {})",
            message.sequence, last_sequence
        );
        return None;
    }
    Some(message.lamp_state)
}

/// Unicast `data`, retrying up to `attempts` times `delay_ms` apart
pub async fn send_with_retry<R: Radio, D: DelayNs>(
    radio: &mut R,
    delay: &mut D,
    peer: MacAddress,
    data: &[u8],
    attempts: u8,
    delay_ms: u32,
) -> Result<()> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match radio.send(peer, data) {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!("send to {} failed ({}/{}): {}", peer, attempt, attempts, e);
                if attempt < attempts {
                    delay.delay_ms(delay_ms).await;
                }
            }
        }
    }
    error!("send to {} failed after {} attempts", peer, attempts);
    Err(Error::SendFailure)
}

/// Controller command sender
#[derive(Debug, Clone, Copy)]
pub struct CommandSender {
    config: SendConfig,
}

impl CommandSender {
    pub fn new(config: SendConfig) -> Self {
        Self { config }
    }

    /// Send `message` to `peer` with the configured retry budget
    pub async fn send<R: Radio, D: DelayNs>(
        &self,
        radio: &mut R,
        delay: &mut D,
        peer: MacAddress,
        message: &DataMessage,
    ) -> Result<()> {
        trace!("send {} seq {}", message.command, message.sequence);
        send_with_retry(
            radio,
            delay,
            peer,
            &message.to_bytes(),
            self.config.max_attempts,
            self.config.retry_delay_ms,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LampConfig;
    use crate::mock::{MockRadio, NoDelay, RecordingOutput, CONTROLLER_MAC, DRIVER_MAC};
    use embassy_futures::block_on;
    use lumen_protocol::{Channel, Duties};

    const STRANGER: MacAddress = MacAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0, 1]);

    fn channel(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    fn driver() -> (PeerRegistry<3>, LampController<RecordingOutput>) {
        let mut registry = PeerRegistry::new();
        registry.register(CONTROLLER_MAC, channel(1)).unwrap();
        let lamp = LampController::new(RecordingOutput::default(), LampConfig::default());
        (registry, lamp)
    }

    fn command(identity: MacAddress, command: Command, state: LampState) -> DataMessage {
        DataMessage::new(Role::Controller, identity, command, 1, state)
    }

    #[test]
    fn test_unauthorized_sender_changes_nothing() {
        let (registry, mut lamp) = driver();
        lamp.power_on(Some(LampState::new(true, 100, 0.5)));
        let before = lamp.state();
        let fades = lamp.output().fades.len();

        for cmd in [
            Command::SetState,
            Command::PowerOn,
            Command::PowerOff,
            Command::StateResponse,
        ] {
            let msg = command(STRANGER, cmd, LampState::new(true, 400, 0.1));
            assert_eq!(
                handle_command(&registry, &mut lamp, &msg),
                Err(Error::UnauthorizedSender(STRANGER))
            );
        }
        assert_eq!(lamp.state(), before);
        assert_eq!(lamp.output().fades.len(), fades);
    }

    #[test]
    fn test_power_on_with_state() {
        let (registry, mut lamp) = driver();
        let msg = command(CONTROLLER_MAC, Command::PowerOn, LampState::new(false, 400, 0.5));
        let echo = handle_command(&registry, &mut lamp, &msg).unwrap();
        assert_eq!(echo, LampState::new(true, 400, 0.5));
    }

    #[test]
    fn test_power_off_then_restore() {
        let (registry, mut lamp) = driver();
        lamp.power_on(Some(LampState::new(true, 300, 0.5)));

        let off = command(CONTROLLER_MAC, Command::PowerOff, LampState::new(false, 300, 0.5));
        let echo = handle_command(&registry, &mut lamp, &off).unwrap();
        assert!(!echo.is_on);
        assert_eq!(lamp.duties(), Duties::OFF);
        assert_eq!(lamp.last_on().brightness, 300);

        let on = command(CONTROLLER_MAC, Command::PowerOn, LampState::UNSET);
        let echo = handle_command(&registry, &mut lamp, &on).unwrap();
        assert_eq!(echo, LampState::new(true, 300, 0.5));
    }

    #[test]
    fn test_set_state_keeps_sent_flag() {
        let (registry, mut lamp) = driver();
        let msg = command(CONTROLLER_MAC, Command::SetState, LampState::new(false, 50, 0.2));
        let echo = handle_command(&registry, &mut lamp, &msg).unwrap();
        assert_eq!(echo, LampState::new(false, 50, 0.2));
    }

    #[test]
    fn test_state_response_rejected_on_driver() {
        let (registry, mut lamp) = driver();
        let msg = command(CONTROLLER_MAC, Command::StateResponse, LampState::default());
        assert_eq!(
            handle_command(&registry, &mut lamp, &msg),
            Err(Error::UnexpectedCommand(Command::StateResponse))
        );
    }

    #[test]
    fn test_echo_acceptance() {
        let peer = Some(PeerSession {
            peer: DRIVER_MAC,
            channel: channel(1),
        });
        let state = LampState::new(true, 222, 0.4);
        let echo = state_response(DRIVER_MAC, 7, state);

        assert_eq!(accepted_echo(peer, 7, &echo), Some(state));
        assert_eq!(accepted_echo(peer, 8, &echo), None);
        assert_eq!(accepted_echo(None, 7, &echo), None);

        let spoofed = state_response(STRANGER, 7, state);
        assert_eq!(accepted_echo(peer, 7, &spoofed), None);

        let not_echo = DataMessage::new(Role::Driver, DRIVER_MAC, Command::SetState, 7, state);
        assert_eq!(accepted_echo(peer, 7, &not_echo), None);
    }

    #[test]
    fn test_send_retries_then_succeeds() {
        let mut radio = MockRadio::new(CONTROLLER_MAC);
        radio.add_peer(DRIVER_MAC, channel(1)).unwrap();
        radio.fail_sends = 2;
        let mut delay = NoDelay::default();

        let sender = CommandSender::new(SendConfig::default());
        let msg = command(CONTROLLER_MAC, Command::SetState, LampState::default());
        block_on(sender.send(&mut radio, &mut delay, DRIVER_MAC, &msg)).unwrap();

        assert_eq!(radio.send_attempts, 3);
        assert_eq!(radio.sent.len(), 1);
        assert_eq!(delay.total_ms(), 100);
    }

    #[test]
    fn test_send_failure_is_bounded() {
        let mut radio = MockRadio::new(CONTROLLER_MAC);
        radio.add_peer(DRIVER_MAC, channel(1)).unwrap();
        radio.unreachable = true;
        let mut delay = NoDelay::default();

        let sender = CommandSender::new(SendConfig::default());
        let msg = command(CONTROLLER_MAC, Command::PowerOn, LampState::UNSET);
        let result = block_on(sender.send(&mut radio, &mut delay, DRIVER_MAC, &msg));

        assert_eq!(result, Err(Error::SendFailure));
        assert_eq!(radio.send_attempts, 3);
        // No delay after the final attempt
        assert_eq!(delay.total_ms(), 100);
    }
}
