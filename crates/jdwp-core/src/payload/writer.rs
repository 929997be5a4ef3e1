//! Builder for command bodies.

use crate::payload::types::{check_width, IdKind, IdSizes, ObjectId, ReferenceTypeId, ThreadId};
use crate::protocol::ProtocolError;

/// Big-endian writer producing a command payload.
#[derive(Debug, Default)]
pub struct PayloadWriter {
    buf: Vec<u8>,
    sizes: IdSizes,
}

impl PayloadWriter {
    pub fn new(sizes: IdSizes) -> Self {
        Self {
            buf: Vec::new(),
            sizes,
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a `u32` byte count followed by the UTF-8 bytes of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if the string is longer
    /// than a `u32` can describe.
    pub fn write_string(&mut self, value: &str) -> Result<(), ProtocolError> {
        let len = u32::try_from(value.len())
            .map_err(|_| ProtocolError::PayloadTooLarge { len: value.len() })?;
        self.write_u32(len);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes `value` using the width configured for `kind`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidIdSize`] if the configured width is not 1–8.
    /// - [`ProtocolError::MalformedPayload`] if `value` needs more bytes than
    ///   the width allows.
    pub fn write_id(&mut self, kind: IdKind, value: u64) -> Result<(), ProtocolError> {
        let width = self.sizes.width(kind) as usize;
        check_width(kind, width as i64)?;
        if width < 8 && value >> (width * 8) != 0 {
            return Err(ProtocolError::MalformedPayload(format!(
                "{} id 0x{value:X} does not fit in {width} bytes",
                kind.as_str()
            )));
        }
        self.buf.extend_from_slice(&value.to_be_bytes()[8 - width..]);
        Ok(())
    }

    pub fn write_object_id(&mut self, id: ObjectId) -> Result<(), ProtocolError> {
        self.write_id(IdKind::Object, id.0)
    }

    pub fn write_thread_id(&mut self, id: ThreadId) -> Result<(), ProtocolError> {
        self.write_id(IdKind::Object, id.0)
    }

    pub fn write_reference_type_id(&mut self, id: ReferenceTypeId) -> Result<(), ProtocolError> {
        self.write_id(IdKind::ReferenceType, id.0)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the payload bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
