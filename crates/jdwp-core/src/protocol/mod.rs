//! Protocol module containing the packet types, the framing codec, and the
//! sequence counter.

pub mod packet;
pub mod sequence;

pub use packet::{
    decode_packet, encode_command, encode_packet, frame_length, CommandFrame, CommandPacket,
    Packet, ProtocolError, ReplyFrame, ReplyPacket, FLAG_REPLY, HANDSHAKE, HEADER_SIZE,
};
pub use sequence::SequenceCounter;
