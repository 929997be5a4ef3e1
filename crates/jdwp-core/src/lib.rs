//! # jdwp-core
//!
//! Shared library for the JDWP client containing the wire packet codec, the
//! sequence id counter, and the payload codec used to describe individual
//! commands.
//!
//! This crate has zero dependencies on sockets or async runtimes.  The
//! session layer (`jdwp-session`) owns the connection and calls into this
//! crate to turn bytes into packets and back.
//!
//! # Architecture overview
//!
//! A debugger talks to a target VM over one TCP connection.  After a fixed
//! ASCII handshake, every unit on the wire is a length-prefixed *packet*:
//! either a command (a request from us, or an unsolicited event from the VM)
//! or a reply to an earlier command.
//!
//! - **`protocol`** – The packet framing: an 11-byte header followed by an
//!   opaque payload.  Also the atomic sequence counter that produces packet
//!   ids.
//!
//! - **`payload`** – A small hand-written codec for the bodies of specific
//!   commands: big-endian integers, length-prefixed strings, and object
//!   identifiers whose width is negotiated at runtime ([`IdSizes`]).
//!
//! - **`commands`** – Typed descriptors for the VirtualMachine and
//!   ThreadReference commands this client issues, plus the reply error codes.

pub mod commands;
pub mod payload;
pub mod protocol;

pub use commands::{CommandId, ErrorCode, JdwpCommand};
pub use payload::{IdSizes, PayloadReader, PayloadWriter};
pub use protocol::packet::{
    decode_packet, encode_command, encode_packet, frame_length, CommandFrame, CommandPacket,
    Packet, ProtocolError, ReplyFrame, ReplyPacket, HEADER_SIZE,
};
pub use protocol::sequence::SequenceCounter;
