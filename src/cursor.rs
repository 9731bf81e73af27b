//! Sequential reader over an in-memory Marshal stream.

use crate::error::MarshalError;

/// A forward-only cursor over a fully-buffered input.
///
/// Tracks the current byte offset for diagnostics; every error produced by
/// the decoder reports the offset at which it was detected. There is no
/// seeking: repeated values are resolved through the symbol and object
/// tables, not by rewinding the stream.
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset from the start of the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Reads exactly `n` bytes, or fails with `TruncatedInput` at the
    /// current offset.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], MarshalError> {
        if self.remaining() < n {
            return Err(MarshalError::TruncatedInput {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, MarshalError> {
        Ok(self.read_exact(1)?[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_position() {
        let mut c = Cursor::new(&[0x01, 0x02, 0x03]);
        assert_eq!(c.position(), 0);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.position(), 1);
        assert_eq!(c.read_exact(2).unwrap(), &[0x02, 0x03]);
        assert_eq!(c.position(), 3);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn short_read_reports_offset() {
        let mut c = Cursor::new(&[0xaa]);
        c.read_u8().unwrap();
        match c.read_exact(4) {
            Err(MarshalError::TruncatedInput {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 0);
            }
            other => panic!("expected TruncatedInput, got {other:?}"),
        }
    }

    #[test]
    fn failed_read_does_not_advance() {
        let mut c = Cursor::new(&[0x01, 0x02]);
        assert!(c.read_exact(3).is_err());
        assert_eq!(c.position(), 0);
        assert_eq!(c.read_exact(2).unwrap(), &[0x01, 0x02]);
    }
}
