//! Byte cursor shared by the header and geometry decoders.
//!
//! The cursor only moves forward. Lookahead (`peek`, `starts_with`) never
//! consumes, which lets the header decoder find line terminators without
//! swallowing the first bytes of a binary geometry stream.

use crate::error::{DecodeError, Result};

/// Forward-only reader over the bytes of one file.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset from the start of input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Whether all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Next byte, without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Byte `offset` positions ahead, without consuming anything.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Whether the unread input begins with `prefix`.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    /// Consume one byte.
    pub fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Consume `n` bytes, or nothing if fewer remain.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.take(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Some(buf)
    }

    /// Consume bytes up to, not including, the next `\r` or `\n`.
    ///
    /// Returns `None` at end of input. The terminator is left in place;
    /// see [`ByteCursor::skip_terminator`].
    pub fn take_line(&mut self) -> Option<&'a [u8]> {
        if self.is_eof() {
            return None;
        }
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == b'\r' || ch == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }

    /// Consume one line terminator: `\r\n`, `\n`, or `\r`.
    pub fn skip_terminator(&mut self) {
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
    }

    /// Read a little-endian `u16`; `context` names the record for errors.
    pub fn read_u16(&mut self, context: &str) -> Result<u16> {
        self.take_array()
            .map(u16::from_le_bytes)
            .ok_or_else(|| self.truncated(context, 2))
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self, context: &str) -> Result<i32> {
        self.take_array()
            .map(i32::from_le_bytes)
            .ok_or_else(|| self.truncated(context, 4))
    }

    /// Read a little-endian IEEE 754 `f32`.
    pub fn read_f32(&mut self, context: &str) -> Result<f32> {
        self.take_array()
            .map(f32::from_le_bytes)
            .ok_or_else(|| self.truncated(context, 4))
    }

    fn truncated(&self, context: &str, wanted: usize) -> DecodeError {
        DecodeError::format(
            context,
            format!(
                "unexpected end of input at byte {}: needed {wanted} bytes, {} left",
                self.pos,
                self.remaining()
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_line_and_terminators() {
        let mut cursor = ByteCursor::new(b"one\r\ntwo\nthree\rfour");
        let mut lines = Vec::new();
        while let Some(line) = cursor.take_line() {
            lines.push(line);
            cursor.skip_terminator();
        }
        assert_eq!(
            lines,
            vec![&b"one"[..], &b"two"[..], &b"three"[..], &b"four"[..]]
        );
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_empty_lines() {
        let mut cursor = ByteCursor::new(b"\n\nx");
        assert_eq!(cursor.take_line(), Some(&b""[..]));
        cursor.skip_terminator();
        assert_eq!(cursor.take_line(), Some(&b""[..]));
        cursor.skip_terminator();
        assert_eq!(cursor.take_line(), Some(&b"x"[..]));
    }

    #[test]
    fn test_little_endian_reads() {
        let mut data = Vec::new();
        data.extend_from_slice(&300u16.to_le_bytes());
        data.extend_from_slice(&(-7i32).to_le_bytes());
        data.extend_from_slice(&2.5f32.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u16("test").unwrap(), 300);
        assert_eq!(cursor.read_i32("test").unwrap(), -7);
        assert_eq!(cursor.read_f32("test").unwrap(), 2.5);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_truncated_read() {
        let mut cursor = ByteCursor::new(&[1, 2, 3]);
        let err = cursor.read_i32("PolyLineLong").unwrap_err();
        assert_eq!(err.declaration(), Some("PolyLineLong"));
        // Nothing is consumed on failure
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_u16("x").unwrap(), 0x0201);
    }

    #[test]
    fn test_lookahead_does_not_consume() {
        let cursor = ByteCursor::new(b"$$HEADEREND\n");
        assert!(cursor.starts_with(b"$$HEADEREND"));
        assert_eq!(cursor.peek_at(11), Some(b'\n'));
        assert_eq!(cursor.position(), 0);
    }
}
