//! Binary Stream Codec
//!
//! Forward-only read/write cursors over a byte stream. Integers are unsigned
//! big-endian with a caller-chosen width, and text is either 8-bit ASCII or
//! UTF-16 big-endian. Lengths are always counted in encoded bytes.

use crate::error::FormatError;
use std::io::{ErrorKind, Read, Write};

/// Text encoding of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One byte per character, 7-bit clean. Used for chunk tags.
    Ascii,
    /// Two bytes per UTF-16 code unit, big-endian. Used for all user data.
    Utf16Be,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Utf16Be => "utf-16-be",
        }
    }

    /// Number of bytes `text` occupies once encoded.
    pub fn encoded_len(self, text: &str) -> usize {
        match self {
            Encoding::Ascii => text.len(),
            Encoding::Utf16Be => text.encode_utf16().count() * 2,
        }
    }

    /// Encode `text` into raw bytes.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, FormatError> {
        match self {
            Encoding::Ascii => {
                if !text.is_ascii() {
                    return Err(FormatError::InvariantViolation(format!(
                        "{:?} is not representable as ascii",
                        text
                    )));
                }
                Ok(text.as_bytes().to_vec())
            }
            Encoding::Utf16Be => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect()),
        }
    }

    /// Decode raw bytes read at `offset`.
    pub fn decode(self, bytes: &[u8], offset: u64) -> Result<String, FormatError> {
        let invalid = |reason: String| FormatError::DecodeError {
            offset,
            encoding: self.name(),
            reason,
        };
        match self {
            Encoding::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(invalid(format!("non-ascii byte 0x{:02x} at {}", bytes[pos], pos)));
                }
                String::from_utf8(bytes.to_vec()).map_err(|e| invalid(e.to_string()))
            }
            Encoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(invalid(format!("odd byte length {}", bytes.len())));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| invalid(e.to_string()))
            }
        }
    }
}

/// Ordered reader over a crate byte stream.
pub struct InputStream<R> {
    reader: R,
    offset: u64,
}

impl<R: Read> InputStream<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read up to `buf.len()` bytes, stopping early only at end of input.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, FormatError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FormatError::Io(e)),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    /// Read exactly `n` bytes.
    ///
    /// The buffer grows with the data actually read, so a corrupt length field
    /// cannot force a huge allocation up front.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, FormatError> {
        let start = self.offset;
        let mut buf = Vec::new();
        let found = (&mut self.reader).take(n as u64).read_to_end(&mut buf)?;
        self.offset += found as u64;
        if found != n {
            return Err(FormatError::TruncatedInput {
                offset: start,
                expected: n,
                found,
            });
        }
        Ok(buf)
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let start = self.offset;
        let mut buf = [0u8; N];
        let found = self.fill(&mut buf)?;
        if found != N {
            return Err(FormatError::TruncatedInput {
                offset: start,
                expected: N,
                found,
            });
        }
        Ok(buf)
    }

    /// Read a 4-byte chunk tag, or `None` when the input ended cleanly.
    ///
    /// A partial tag is still a truncation.
    pub fn read_tag_or_eof(&mut self) -> Result<Option<[u8; 4]>, FormatError> {
        let start = self.offset;
        let mut tag = [0u8; 4];
        match self.fill(&mut tag)? {
            0 => Ok(None),
            4 => Ok(Some(tag)),
            found => Err(FormatError::TruncatedInput {
                offset: start,
                expected: 4,
                found,
            }),
        }
    }

    /// Consume `expected.len()` bytes and require them to equal `expected`.
    pub fn expect_bytes(&mut self, expected: &[u8]) -> Result<(), FormatError> {
        let start = self.offset;
        let found = self.read_exact(expected.len())?;
        if found != expected {
            return Err(FormatError::FormatMismatch {
                offset: start,
                expected: format!("{:02x?}", expected),
                found: format!("{:02x?}", found),
            });
        }
        Ok(())
    }

    /// Consume the encoded form of `text` and require an exact match.
    pub fn expect_literal(&mut self, text: &str, encoding: Encoding) -> Result<(), FormatError> {
        let start = self.offset;
        let expected = encoding.encode(text)?;
        let found = self.read_exact(expected.len())?;
        if found != expected {
            let found = encoding
                .decode(&found, start)
                .unwrap_or_else(|_| format!("{:02x?}", found));
            return Err(FormatError::FormatMismatch {
                offset: start,
                expected: text.to_string(),
                found,
            });
        }
        Ok(())
    }

    /// Read `len` bytes and decode them as text.
    pub fn read_text(&mut self, len: usize, encoding: Encoding) -> Result<String, FormatError> {
        let start = self.offset;
        let bytes = self.read_exact(len)?;
        encoding.decode(&bytes, start)
    }

    /// Read a big-endian unsigned integer `width` bytes wide (1..=8).
    pub fn read_uint(&mut self, width: usize) -> Result<u64, FormatError> {
        check_width(width)?;
        let bytes = self.read_exact(width)?;
        Ok(bytes
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }
}

/// Ordered writer producing a crate byte stream.
pub struct OutputStream<W> {
    writer: W,
    offset: u64,
}

impl<W: Write> OutputStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, offset: 0 }
    }

    /// Bytes written so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.writer.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Encode `text` and write the raw bytes.
    pub fn write_text(&mut self, text: &str, encoding: Encoding) -> Result<(), FormatError> {
        let bytes = encoding.encode(text)?;
        self.write_bytes(&bytes)
    }

    /// Write a fixed literal, the counterpart of [`InputStream::expect_literal`].
    pub fn write_literal(&mut self, text: &str, encoding: Encoding) -> Result<(), FormatError> {
        self.write_text(text, encoding)
    }

    /// Write `value` as a big-endian unsigned integer `width` bytes wide.
    pub fn write_uint(&mut self, value: u64, width: usize) -> Result<(), FormatError> {
        check_width(width)?;
        if width < 8 && value >> (width * 8) != 0 {
            return Err(FormatError::InvariantViolation(format!(
                "{} does not fit in {} bytes",
                value, width
            )));
        }
        let bytes = value.to_be_bytes();
        self.write_bytes(&bytes[8 - width..])
    }

    pub fn flush(&mut self) -> Result<(), FormatError> {
        self.writer.flush()?;
        Ok(())
    }
}

fn check_width(width: usize) -> Result<(), FormatError> {
    if width == 0 || width > 8 {
        return Err(FormatError::InvariantViolation(format!(
            "integer width must be 1..=8 bytes, got {}",
            width
        )));
    }
    Ok(())
}
