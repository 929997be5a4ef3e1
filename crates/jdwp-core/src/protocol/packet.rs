//! Packet types and the binary framing codec.
//!
//! Wire format:
//! ```text
//! command: [length:4][id:4][flags:1][command_set:1][command:1][data:N]
//! reply:   [length:4][id:4][flags:1][error_code:2][data:N]
//! ```
//! `length` counts every byte of the packet including itself, so the
//! smallest legal value is [`HEADER_SIZE`] (11).  All multi-byte integers are
//! big-endian.  Bit [`FLAG_REPLY`] of `flags` is the only thing that
//! distinguishes a reply from a command.

use thiserror::Error;

/// Size of the fixed packet header in bytes.
pub const HEADER_SIZE: usize = 11;

/// Flag bit marking a reply packet.
pub const FLAG_REPLY: u8 = 0x80;

/// ASCII magic exchanged once in each direction before the first packet.
pub const HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// Errors that can occur while framing or unframing packets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The length prefix declares fewer bytes than the fixed header.
    #[error("packet too small: declared length {declared}, minimum is {HEADER_SIZE}")]
    FrameTooShort { declared: u32 },

    /// The payload cannot be described by a 32-bit length prefix.
    #[error("payload of {len} bytes does not fit in a packet")]
    PayloadTooLarge { len: usize },

    /// The byte slice is shorter than the packet it starts.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// A command or reply body could not be parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An identifier width outside 1..=8 bytes was configured or reported.
    #[error("invalid {kind} id size: {size} (must be 1..=8)")]
    InvalidIdSize { kind: &'static str, size: i64 },
}

// ── Packet types ──────────────────────────────────────────────────────────────

/// The body of a command packet, without its id.
///
/// This is what callers hand to the session; the session assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    pub command_set: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

impl CommandPacket {
    /// Creates a command packet with an empty payload.
    pub fn new(command_set: u8, command: u8) -> Self {
        Self {
            command_set,
            command,
            data: Vec::new(),
        }
    }

    /// Creates a command packet carrying `data`.
    pub fn with_data(command_set: u8, command: u8, data: Vec<u8>) -> Self {
        Self {
            command_set,
            command,
            data,
        }
    }
}

/// The body of a reply packet, without its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPacket {
    /// `0` on success, otherwise one of the JDWP error constants.
    pub error_code: u16,
    pub data: Vec<u8>,
}

impl ReplyPacket {
    /// Returns `true` when the VM reported an error for the command.
    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }
}

/// A decoded command packet: either one of our requests or a VM event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub id: u32,
    pub flags: u8,
    pub packet: CommandPacket,
}

/// A decoded reply packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFrame {
    pub id: u32,
    pub flags: u8,
    pub packet: ReplyPacket,
}

/// One packet as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Command(CommandFrame),
    Reply(ReplyFrame),
}

impl Packet {
    /// The sequence id carried in the header.
    pub fn id(&self) -> u32 {
        match self {
            Packet::Command(f) => f.id,
            Packet::Reply(f) => f.id,
        }
    }

    /// The raw flags byte carried in the header.
    pub fn flags(&self) -> u8 {
        match self {
            Packet::Command(f) => f.flags,
            Packet::Reply(f) => f.flags,
        }
    }

    /// Total encoded size of this packet including the header.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE
            + match self {
                Packet::Command(f) => f.packet.data.len(),
                Packet::Reply(f) => f.packet.data.len(),
            }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Validates a 4-byte length prefix and returns the total packet length.
///
/// This lets a stream reader reject a bad packet before reading any other
/// header field.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooShort`] when the declared length is
/// below [`HEADER_SIZE`].
pub fn frame_length(prefix: [u8; 4]) -> Result<usize, ProtocolError> {
    let declared = u32::from_be_bytes(prefix);
    if (declared as usize) < HEADER_SIZE {
        return Err(ProtocolError::FrameTooShort { declared });
    }
    Ok(declared as usize)
}

/// Encodes an outbound request as a command packet with flags `0x00`.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if the total length overflows
/// the 32-bit length field.
///
/// # Examples
///
/// ```rust
/// use jdwp_core::{encode_command, CommandPacket};
///
/// let bytes = encode_command(7, &CommandPacket::new(1, 1)).unwrap();
/// assert_eq!(bytes, [0, 0, 0, 11, 0, 0, 0, 7, 0x00, 1, 1]);
/// ```
pub fn encode_command(id: u32, packet: &CommandPacket) -> Result<Vec<u8>, ProtocolError> {
    let length = total_length(packet.data.len())?;
    let mut buf = Vec::with_capacity(length as usize);
    buf.extend_from_slice(&length.to_be_bytes());
    buf.extend_from_slice(&id.to_be_bytes());
    buf.push(0x00);
    buf.push(packet.command_set);
    buf.push(packet.command);
    buf.extend_from_slice(&packet.data);
    Ok(buf)
}

/// Encodes any [`Packet`] exactly as given, flags included.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if the total length overflows
/// the 32-bit length field.
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    let (id, flags, data) = match packet {
        Packet::Command(f) => (f.id, f.flags, &f.packet.data),
        Packet::Reply(f) => (f.id, f.flags, &f.packet.data),
    };
    let length = total_length(data.len())?;

    let mut buf = Vec::with_capacity(length as usize);
    buf.extend_from_slice(&length.to_be_bytes());
    buf.extend_from_slice(&id.to_be_bytes());
    buf.push(flags);
    match packet {
        Packet::Command(f) => {
            buf.push(f.packet.command_set);
            buf.push(f.packet.command);
        }
        Packet::Reply(f) => buf.extend_from_slice(&f.packet.error_code.to_be_bytes()),
    }
    buf.extend_from_slice(data);
    Ok(buf)
}

/// Decodes one [`Packet`] from the beginning of `bytes`.
///
/// Returns the packet and the number of bytes consumed, so the caller can
/// advance its read cursor.
///
/// # Errors
///
/// - [`ProtocolError::FrameTooShort`] if the length prefix is below 11.
/// - [`ProtocolError::InsufficientData`] if `bytes` ends before the packet
///   does; this is not fatal for a buffering reader.
///
/// # Examples
///
/// ```rust
/// use jdwp_core::{decode_packet, encode_command, CommandPacket, Packet};
///
/// let bytes = encode_command(3, &CommandPacket::with_data(1, 7, vec![9])).unwrap();
/// let (packet, n) = decode_packet(&bytes).unwrap();
/// assert_eq!(n, bytes.len());
/// assert!(matches!(packet, Packet::Command(f) if f.id == 3 && f.packet.command == 7));
/// ```
pub fn decode_packet(bytes: &[u8]) -> Result<(Packet, usize), ProtocolError> {
    if bytes.len() < 4 {
        return Err(ProtocolError::InsufficientData {
            needed: 4,
            available: bytes.len(),
        });
    }
    let length = frame_length([bytes[0], bytes[1], bytes[2], bytes[3]])?;
    if bytes.len() < length {
        return Err(ProtocolError::InsufficientData {
            needed: length,
            available: bytes.len(),
        });
    }

    let id = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let flags = bytes[8];
    let data = bytes[HEADER_SIZE..length].to_vec();

    let packet = if flags & FLAG_REPLY == FLAG_REPLY {
        Packet::Reply(ReplyFrame {
            id,
            flags,
            packet: ReplyPacket {
                error_code: u16::from_be_bytes([bytes[9], bytes[10]]),
                data,
            },
        })
    } else {
        Packet::Command(CommandFrame {
            id,
            flags,
            packet: CommandPacket {
                command_set: bytes[9],
                command: bytes[10],
                data,
            },
        })
    };
    Ok((packet, length))
}

fn total_length(payload_len: usize) -> Result<u32, ProtocolError> {
    payload_len
        .checked_add(HEADER_SIZE)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(ProtocolError::PayloadTooLarge { len: payload_len })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
