//! Payload codec for command and reply bodies.
//!
//! The packet codec treats payloads as opaque bytes.  This module gives the
//! command descriptors a way to read and write the handful of primitive
//! types JDWP bodies are built from:
//!
//! | Type          | Encoding                                        |
//! |---------------|-------------------------------------------------|
//! | byte, boolean | 1 byte (boolean: non-zero is `true`)            |
//! | int           | 4 bytes, big-endian, signed                     |
//! | long          | 8 bytes, big-endian                             |
//! | string        | 4-byte length, then that many UTF-8 bytes       |
//! | identifiers   | 1–8 bytes, width negotiated through [`IdSizes`] |

pub mod reader;
pub mod types;
pub mod writer;

pub use reader::PayloadReader;
pub use types::{
    ClassStatus, IdKind, IdSizes, ObjectId, ReferenceTypeId, ThreadGroupId, ThreadId, TypeTag,
};
pub use writer::PayloadWriter;
