//! Bounded writer over a caller-supplied output buffer.

use crate::error::{Error, Result};

/// Appends bytes to a fixed slice, failing with `BufferTooSmall` instead of growing.
pub(crate) struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(Error::BufferTooSmall {
                required: end,
                capacity: self.buf.len(),
            });
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.put(&[v])
    }

    #[inline]
    pub fn put_u16_le(&mut self, v: u16) -> Result<()> {
        self.put(&v.to_le_bytes())
    }

    /// Zero everything written so far and rewind.
    pub fn discard(&mut self) {
        self.buf[..self.pos].fill(0);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_reports_required() {
        let mut buf = [0u8; 3];
        let mut w = SliceWriter::new(&mut buf);
        w.put(&[1, 2]).unwrap();
        let err = w.put(&[3, 4]).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferTooSmall {
                required: 4,
                capacity: 3
            }
        ));
        assert_eq!(w.position(), 2);
        w.discard();
        assert_eq!(buf, [0, 0, 0]);
    }
}
