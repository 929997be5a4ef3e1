//! ThreadReference command set (command set 11).

use crate::commands::{CommandId, JdwpCommand};
use crate::payload::{PayloadReader, PayloadWriter, ThreadId};
use crate::protocol::ProtocolError;

pub const COMMAND_SET: u8 = 11;

/// Returns the name of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name {
    pub thread: ThreadId,
}

impl JdwpCommand for Name {
    const ID: CommandId = CommandId::new(COMMAND_SET, 1);
    type Reply = String;

    fn encode(&self, w: &mut PayloadWriter) -> Result<(), ProtocolError> {
        w.write_thread_id(self.thread)
    }

    fn decode_reply(r: &mut PayloadReader<'_>) -> Result<String, ProtocolError> {
        r.read_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::IdSizes;

    #[test]
    fn test_name_encodes_thread_id_with_object_width() {
        // Arrange
        let sizes = IdSizes {
            object_id: 4,
            ..IdSizes::default()
        };

        // Act
        let packet = Name { thread: ThreadId(0x2A) }.to_packet(sizes).unwrap();

        // Assert
        assert_eq!((packet.command_set, packet.command), (11, 1));
        assert_eq!(packet.data, [0, 0, 0, 0x2A]);
    }

    #[test]
    fn test_name_reply_is_a_string() {
        let body = [0, 0, 0, 4, b'm', b'a', b'i', b'n'];
        let name = Name::parse_reply(&body, IdSizes::default()).unwrap();
        assert_eq!(name, "main");
    }
}
