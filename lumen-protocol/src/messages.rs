//! Datagram records for the controller <-> driver link
//!
//! Two record types share a common header (`type`, `role`, `identity`):
//! - Pairing: discovery request from a controller, reply from a driver
//! - Data: lamp commands from a controller, state echoes from a driver

use heapless::Vec;

use crate::address::{Channel, MacAddress};
use crate::lamp::{LampState, LAMP_STATE_SIZE};

// Message type IDs
pub const MSG_PAIRING: u8 = 0x00;
pub const MSG_DATA: u8 = 0x01;

// Node role IDs
pub const ROLE_CONTROLLER: u8 = 1;
pub const ROLE_DRIVER: u8 = 10;

// Command IDs
pub const CMD_SET_STATE: u8 = 0;
pub const CMD_POWER_ON: u8 = 1;
pub const CMD_POWER_OFF: u8 = 2;
pub const CMD_STATE_RESPONSE: u8 = 3;

/// Encoded size of a pairing record
pub const PAIRING_MESSAGE_SIZE: usize = 13;

/// Encoded size of a data record
pub const DATA_MESSAGE_SIZE: usize = 17;

/// Largest record on the wire
pub const MAX_MESSAGE_SIZE: usize = DATA_MESSAGE_SIZE;

/// Errors that can occur while decoding or encoding a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Zero-length datagram
    Empty,
    /// First byte is not a known message type
    UnknownType(u8),
    /// Fewer bytes than the declared message type needs
    Truncated { msg_type: u8, len: usize },
    /// Role byte is neither controller nor driver
    UnknownRole(u8),
    /// Command byte is not a known command
    UnknownCommand(u8),
    /// Channel outside 1..=13
    InvalidChannel(u8),
    /// Lamp state with a bad on flag, brightness or balance
    InvalidLampState,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl WireError {
    /// Whether the error describes a received datagram that must be dropped
    pub fn is_malformed(&self) -> bool {
        !matches!(self, WireError::BufferTooSmall)
    }
}

/// Which side of the link sent a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Controller,
    Driver,
}

impl Role {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            ROLE_CONTROLLER => Some(Role::Controller),
            ROLE_DRIVER => Some(Role::Driver),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Role::Controller => ROLE_CONTROLLER,
            Role::Driver => ROLE_DRIVER,
        }
    }
}

/// Lamp command carried by a data record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Adopt brightness/balance and on flag as sent
    SetState,
    /// Turn on, with the attached state or the driver's saved one
    PowerOn,
    /// Turn off, remembering brightness/balance
    PowerOff,
    /// Driver's authoritative state after a command
    StateResponse,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_SET_STATE => Some(Command::SetState),
            CMD_POWER_ON => Some(Command::PowerOn),
            CMD_POWER_OFF => Some(Command::PowerOff),
            CMD_STATE_RESPONSE => Some(Command::StateResponse),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Command::SetState => CMD_SET_STATE,
            Command::PowerOn => CMD_POWER_ON,
            Command::PowerOff => CMD_POWER_OFF,
            Command::StateResponse => CMD_STATE_RESPONSE,
        }
    }
}

/// Discovery request (controller) or reply (driver)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairingMessage {
    pub role: Role,
    /// Sender's real hardware address
    pub identity: MacAddress,
    /// Channel the sender is listening on
    pub channel: Channel,
    /// Sender uptime in milliseconds
    pub timestamp: u32,
}

impl PairingMessage {
    pub const SIZE: usize = PAIRING_MESSAGE_SIZE;

    pub fn new(role: Role, identity: MacAddress, channel: Channel, timestamp: u32) -> Self {
        Self {
            role,
            identity,
            channel,
            timestamp,
        }
    }

    /// Encode into a fixed-size record
    pub fn to_bytes(&self) -> [u8; PAIRING_MESSAGE_SIZE] {
        let mut buf = [0u8; PAIRING_MESSAGE_SIZE];
        buf[0] = MSG_PAIRING;
        buf[1] = self.role.to_byte();
        buf[2..8].copy_from_slice(&self.identity.octets());
        buf[8] = self.channel.number();
        buf[9..13].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Decode a pairing record. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let record = header(bytes, MSG_PAIRING, PAIRING_MESSAGE_SIZE)?;
        let role = Role::from_byte(record[1]).ok_or(WireError::UnknownRole(record[1]))?;
        let channel = Channel::new(record[8]).ok_or(WireError::InvalidChannel(record[8]))?;
        Ok(Self {
            role,
            identity: identity_at(record),
            channel,
            timestamp: u32::from_le_bytes([record[9], record[10], record[11], record[12]]),
        })
    }
}

/// Lamp command (controller) or state echo (driver)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataMessage {
    pub role: Role,
    /// Sender's real hardware address
    pub identity: MacAddress,
    pub command: Command,
    /// Wrapping counter for loss/duplicate diagnostics
    pub sequence: u8,
    pub lamp_state: LampState,
}

impl DataMessage {
    pub const SIZE: usize = DATA_MESSAGE_SIZE;

    pub fn new(
        role: Role,
        identity: MacAddress,
        command: Command,
        sequence: u8,
        lamp_state: LampState,
    ) -> Self {
        Self {
            role,
            identity,
            command,
            sequence,
            lamp_state,
        }
    }

    /// Encode into a fixed-size record
    pub fn to_bytes(&self) -> [u8; DATA_MESSAGE_SIZE] {
        let mut buf = [0u8; DATA_MESSAGE_SIZE];
        buf[0] = MSG_DATA;
        buf[1] = self.role.to_byte();
        buf[2..8].copy_from_slice(&self.identity.octets());
        buf[8] = self.command.to_byte();
        buf[9] = self.sequence;
        let mut state = [0u8; LAMP_STATE_SIZE];
        self.lamp_state.write_to(&mut state);
        buf[10..17].copy_from_slice(&state);
        buf
    }

    /// Decode a data record. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let record = header(bytes, MSG_DATA, DATA_MESSAGE_SIZE)?;
        let role = Role::from_byte(record[1]).ok_or(WireError::UnknownRole(record[1]))?;
        let command =
            Command::from_byte(record[8]).ok_or(WireError::UnknownCommand(record[8]))?;
        let mut state = [0u8; LAMP_STATE_SIZE];
        state.copy_from_slice(&record[10..17]);
        let lamp_state = LampState::read_from(&state).ok_or(WireError::InvalidLampState)?;
        Ok(Self {
            role,
            identity: identity_at(record),
            command,
            sequence: record[9],
            lamp_state,
        })
    }
}

/// Any record received from the link
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Pairing(PairingMessage),
    Data(DataMessage),
}

impl Message {
    /// Decode a datagram, dispatching on its type byte
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        match bytes.first() {
            None => Err(WireError::Empty),
            Some(&MSG_PAIRING) => PairingMessage::decode(bytes).map(Message::Pairing),
            Some(&MSG_DATA) => DataMessage::decode(bytes).map(Message::Data),
            Some(&other) => Err(WireError::UnknownType(other)),
        }
    }

    /// Encode this message into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, WireError> {
        let mut record = [0u8; MAX_MESSAGE_SIZE];
        let len = match self {
            Message::Pairing(msg) => {
                record[..PAIRING_MESSAGE_SIZE].copy_from_slice(&msg.to_bytes());
                PAIRING_MESSAGE_SIZE
            }
            Message::Data(msg) => {
                record.copy_from_slice(&msg.to_bytes());
                DATA_MESSAGE_SIZE
            }
        };
        if buffer.len() < len {
            return Err(WireError::BufferTooSmall);
        }
        buffer[..len].copy_from_slice(&record[..len]);
        Ok(len)
    }

    /// Encode this message into a heapless Vec
    pub fn to_vec(&self) -> Vec<u8, MAX_MESSAGE_SIZE> {
        let mut vec = Vec::new();
        // Every record fits MAX_MESSAGE_SIZE
        let _ = match self {
            Message::Pairing(msg) => vec.extend_from_slice(&msg.to_bytes()),
            Message::Data(msg) => vec.extend_from_slice(&msg.to_bytes()),
        };
        vec
    }

    /// Payload identity of the sender
    pub fn identity(&self) -> MacAddress {
        match self {
            Message::Pairing(msg) => msg.identity,
            Message::Data(msg) => msg.identity,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::Pairing(msg) => msg.role,
            Message::Data(msg) => msg.role,
        }
    }
}

/// Validate type byte and length, returning exactly the record bytes
fn header(bytes: &[u8], msg_type: u8, size: usize) -> Result<&[u8], WireError> {
    match bytes.first() {
        None => return Err(WireError::Empty),
        Some(&t) if t != msg_type => return Err(WireError::UnknownType(t)),
        Some(_) => {}
    }
    bytes.get(..size).ok_or(WireError::Truncated {
        msg_type,
        len: bytes.len(),
    })
}

fn identity_at(record: &[u8]) -> MacAddress {
    let mut octets = [0u8; MacAddress::LEN];
    octets.copy_from_slice(&record[2..8]);
    MacAddress::new(octets)
}
