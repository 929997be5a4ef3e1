//! Cursor over a reply body.

use crate::payload::types::{
    check_width, IdKind, IdSizes, ObjectId, ReferenceTypeId, ThreadGroupId, ThreadId,
};
use crate::protocol::ProtocolError;

/// Bounds-checked big-endian reader over a payload slice.
///
/// Every read advances the cursor.  A read that would run past the end of
/// the slice returns [`ProtocolError::InsufficientData`] and leaves the
/// cursor where it was.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
    sizes: IdSizes,
}

impl<'a> PayloadReader<'a> {
    pub fn new(buf: &'a [u8], sizes: IdSizes) -> Self {
        Self { buf, pos: 0, sizes }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    /// Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a string: a `u32` byte count followed by the bytes.
    ///
    /// VMs send modified UTF-8, which differs from UTF-8 for NUL and
    /// supplementary characters; such sequences are replaced with U+FFFD
    /// rather than rejected.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let start = self.pos;
        let len = self.read_u32()? as usize;
        match self.take(len) {
            Ok(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Reads a count prefix and rejects negative values.
    pub fn read_count(&mut self) -> Result<usize, ProtocolError> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| ProtocolError::MalformedPayload(format!("negative count {count}")))
    }

    /// Reads an identifier whose width is taken from the [`IdSizes`] table.
    pub fn read_id(&mut self, kind: IdKind) -> Result<u64, ProtocolError> {
        let width = self.sizes.width(kind);
        check_width(kind, i64::from(width))?;
        let bytes = self.take(width as usize)?;
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    pub fn read_object_id(&mut self) -> Result<ObjectId, ProtocolError> {
        self.read_id(IdKind::Object).map(ObjectId)
    }

    pub fn read_thread_id(&mut self) -> Result<ThreadId, ProtocolError> {
        self.read_id(IdKind::Object).map(ThreadId)
    }

    pub fn read_thread_group_id(&mut self) -> Result<ThreadGroupId, ProtocolError> {
        self.read_id(IdKind::Object).map(ThreadGroupId)
    }

    pub fn read_reference_type_id(&mut self) -> Result<ReferenceTypeId, ProtocolError> {
        self.read_id(IdKind::ReferenceType).map(ReferenceTypeId)
    }

    /// Asserts that the whole payload has been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPayload`] if bytes are left over.
    pub fn finish(self) -> Result<(), ProtocolError> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(ProtocolError::MalformedPayload(format!(
                "{} trailing bytes after offset {}",
                self.remaining(),
                self.pos
            )))
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::InsufficientData {
                needed: self.pos + n,
                available: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(buf: &[u8]) -> PayloadReader<'_> {
        PayloadReader::new(buf, IdSizes::default())
    }

    #[test]
    fn test_reads_big_endian_integers() {
        let buf = [0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFE, 0x01];
        let mut r = reader(&buf);
        assert_eq!(r.read_u32().unwrap(), 256);
        assert_eq!(r.read_i32().unwrap(), -2);
        assert!(r.read_bool().unwrap());
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_read_string_with_length_prefix() {
        let mut buf = vec![0, 0, 0, 4];
        buf.extend_from_slice(b"main");
        let mut r = reader(&buf);
        assert_eq!(r.read_string().unwrap(), "main");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_truncated_string_leaves_cursor_untouched() {
        // Arrange – declares 10 bytes but carries 2
        let buf = [0, 0, 0, 10, b'h', b'i'];
        let mut r = reader(&buf);

        // Act
        let result = r.read_string();

        // Assert
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientData {
                needed: 14,
                available: 6
            })
        );
        assert_eq!(r.remaining(), 6);
    }

    #[test]
    fn test_read_id_honours_configured_width() {
        // Arrange
        let sizes = IdSizes {
            object_id: 4,
            reference_type_id: 2,
            ..IdSizes::default()
        };
        let buf = [0x00, 0x00, 0x12, 0x34, 0xAB, 0xCD];
        let mut r = PayloadReader::new(&buf, sizes);

        // Act
        let thread = r.read_thread_id().unwrap();
        let class = r.read_reference_type_id().unwrap();

        // Assert
        assert_eq!(thread, ThreadId(0x1234));
        assert_eq!(class, ReferenceTypeId(0xABCD));
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_read_id_rejects_zero_width() {
        let sizes = IdSizes {
            object_id: 0,
            ..IdSizes::default()
        };
        let mut r = PayloadReader::new(&[1, 2, 3], sizes);
        assert!(matches!(
            r.read_object_id(),
            Err(ProtocolError::InvalidIdSize { kind: "object", size: 0 })
        ));
    }

    #[test]
    fn test_read_count_rejects_negative() {
        let mut r = reader(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(r.read_count(), Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_finish_rejects_trailing_bytes() {
        let mut r = reader(&[1, 2]);
        r.read_u8().unwrap();
        assert!(matches!(r.finish(), Err(ProtocolError::MalformedPayload(_))));
    }
}
