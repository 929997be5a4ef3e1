//! Typed command descriptors.
//!
//! Each command is a small struct holding its arguments and implementing
//! [`JdwpCommand`], which names the `(command_set, command)` pair, writes
//! the request body, and parses the reply body.  The transport never looks
//! inside these bodies; only the façade in `jdwp-client` does.

pub mod error;
pub mod thread;
pub mod vm;

pub use error::ErrorCode;

use std::fmt;

use crate::payload::{IdSizes, PayloadReader, PayloadWriter};
use crate::protocol::{CommandPacket, ProtocolError};

/// Address of a command: its command set and its number within that set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId {
    pub command_set: u8,
    pub command: u8,
}

impl CommandId {
    pub const fn new(command_set: u8, command: u8) -> Self {
        Self {
            command_set,
            command,
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.command_set, self.command)
    }
}

/// A request the debugger can send, paired with the reply it expects.
pub trait JdwpCommand {
    /// Command set and command number.
    const ID: CommandId;

    /// Parsed reply body.
    type Reply;

    /// Writes the request body.  Commands without arguments keep the default.
    fn encode(&self, _writer: &mut PayloadWriter) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Reads the reply body from `reader`.
    fn decode_reply(reader: &mut PayloadReader<'_>) -> Result<Self::Reply, ProtocolError>;

    /// Builds the command packet for this request.
    fn to_packet(&self, sizes: IdSizes) -> Result<CommandPacket, ProtocolError> {
        let mut writer = PayloadWriter::new(sizes);
        self.encode(&mut writer)?;
        Ok(CommandPacket::with_data(
            Self::ID.command_set,
            Self::ID.command,
            writer.into_bytes(),
        ))
    }

    /// Parses a complete reply body, rejecting trailing bytes.
    fn parse_reply(data: &[u8], sizes: IdSizes) -> Result<Self::Reply, ProtocolError> {
        let mut reader = PayloadReader::new(data, sizes);
        let reply = Self::decode_reply(&mut reader)?;
        reader.finish()?;
        Ok(reply)
    }
}
