//! Crate Record
//!
//! In-memory form of one Serato `.crate` file and its chunk codec.
//!
//! Layout, all integers big-endian:
//! ```text
//! vrsn 00 00 <version: 8 bytes utf-16>  "/Serato ScratchLive Crate" (utf-16)
//! osrt <L> tvcn <n> <sort key>  brev <flag: 5 bytes>             L = n + 17
//! ovct <L> tvcn <n> <column>    tvcw 00 00 00 02 00 "0"          L = n + 18  (per column)
//! otrk <L> ptrk <n> <track path>                                 L = n + 8   (per track)
//! ```
//! The additive constants are fixed by the format and are checked on read.
//! Every length is recomputed from live data on write.

use crate::codec::{Encoding, InputStream, OutputStream};
use crate::error::{FormatError, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Separator between parent and child segments in a crate name.
pub const DELIMITER: &str = "%%";

/// File extension of a persisted crate.
pub const CRATE_EXTENSION: &str = "crate";

/// Schema marker that follows the version in every header.
pub const CRATE_MARKER: &str = "/Serato ScratchLive Crate";

pub const DEFAULT_VERSION: &str = "81.0";
pub const DEFAULT_SORT_KEY: &str = "song";
pub const DEFAULT_SORT_REVERSED: u64 = 256;
pub const DEFAULT_COLUMNS: [&str; 4] = ["song", "artist", "album", "length"];

const TAG_VRSN: &[u8; 4] = b"vrsn";
const TAG_OVCT: &[u8; 4] = b"ovct";
const TAG_OSRT: &[u8; 4] = b"osrt";
const TAG_OTRK: &[u8; 4] = b"otrk";
const TAG_TVCN: &[u8; 4] = b"tvcn";
const TAG_TVCW: &[u8; 4] = b"tvcw";
const TAG_BREV: &[u8; 4] = b"brev";
const TAG_PTRK: &[u8; 4] = b"ptrk";

const LENGTH_WIDTH: usize = 4;
const VERSION_LEN: usize = 8;
const SORT_REVERSED_WIDTH: usize = 5;
const COLUMN_WIDTH_VALUE: u64 = 2;

const OSRT_OVERHEAD: u64 = 17;
const OVCT_OVERHEAD: u64 = 18;
const OTRK_OVERHEAD: u64 = 8;

/// One Serato crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrateRecord {
    /// Full delimiter-encoded name, without the `.crate` extension.
    pub name: String,
    pub version: String,
    /// Column the crate is sorted by, e.g. `song`.
    pub sort_key: String,
    /// Opaque 5-byte `brev` value.
    pub sort_reversed: u64,
    pub columns: Vec<String>,
    /// Track paths in display order.
    pub tracks: Vec<String>,
}

impl CrateRecord {
    /// Create a crate with default display metadata and no tracks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_VERSION.to_string(),
            sort_key: DEFAULT_SORT_KEY.to_string(),
            sort_reversed: DEFAULT_SORT_REVERSED,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            tracks: Vec::new(),
        }
    }

    /// Name with the delimiter shown as `/`.
    pub fn display_name(&self) -> String {
        self.name.replace(DELIMITER, "/")
    }

    /// `<name>.crate`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, CRATE_EXTENSION)
    }

    /// Crate name for a store file name, or `None` if it is not a crate file.
    pub fn name_from_file_name(file_name: &str) -> Option<&str> {
        file_name
            .strip_suffix(CRATE_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .filter(|stem| !stem.is_empty())
    }

    /// Decode a crate body. `name` comes from the file name, not the bytes.
    pub fn decode<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, FormatError> {
        let mut stream = InputStream::new(reader);

        stream.expect_bytes(TAG_VRSN)?;
        stream.expect_bytes(&[0x00, 0x00])?;
        let version = stream.read_text(VERSION_LEN, Encoding::Utf16Be)?;
        stream.expect_literal(CRATE_MARKER, Encoding::Utf16Be)?;

        let mut record = CrateRecord {
            name: name.into(),
            version,
            sort_key: DEFAULT_SORT_KEY.to_string(),
            sort_reversed: DEFAULT_SORT_REVERSED,
            columns: Vec::new(),
            tracks: Vec::new(),
        };

        let mut seen_sort = false;
        loop {
            let section_offset = stream.offset();
            let tag = match stream.read_tag_or_eof()? {
                // Header only: a crate with no tracks.
                None => return Ok(record),
                Some(tag) => tag,
            };
            match &tag {
                TAG_OTRK => break,
                TAG_OVCT => record.columns.push(read_column(&mut stream)?),
                TAG_OSRT => {
                    if seen_sort {
                        return Err(FormatError::InvariantViolation(format!(
                            "second osrt section at byte {}",
                            section_offset
                        )));
                    }
                    seen_sort = true;
                    let (sort_key, sort_reversed) = read_sort(&mut stream)?;
                    record.sort_key = sort_key;
                    record.sort_reversed = sort_reversed;
                }
                _ => return Err(unknown_section(section_offset, &tag)),
            }
        }

        // The first otrk tag was consumed by the header loop.
        loop {
            record.tracks.push(read_track(&mut stream)?);
            let section_offset = stream.offset();
            match stream.read_tag_or_eof()? {
                None => break,
                Some(tag) if &tag == TAG_OTRK => continue,
                Some(tag) => return Err(unknown_section(section_offset, &tag)),
            }
        }

        Ok(record)
    }

    /// Decode from an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, FormatError> {
        Self::decode(name, bytes)
    }

    /// Encode the crate body.
    pub fn encode<W: Write>(&self, writer: W) -> Result<(), FormatError> {
        if Encoding::Utf16Be.encoded_len(&self.version) != VERSION_LEN {
            return Err(FormatError::InvariantViolation(format!(
                "version {:?} must encode to {} bytes",
                self.version, VERSION_LEN
            )));
        }

        let mut out = OutputStream::new(writer);
        out.write_bytes(TAG_VRSN)?;
        out.write_bytes(&[0x00, 0x00])?;
        out.write_text(&self.version, Encoding::Utf16Be)?;
        out.write_literal(CRATE_MARKER, Encoding::Utf16Be)?;

        let sort_len = Encoding::Utf16Be.encoded_len(&self.sort_key) as u64;
        out.write_bytes(TAG_OSRT)?;
        out.write_uint(sort_len + OSRT_OVERHEAD, LENGTH_WIDTH)?;
        out.write_bytes(TAG_TVCN)?;
        out.write_uint(sort_len, LENGTH_WIDTH)?;
        out.write_text(&self.sort_key, Encoding::Utf16Be)?;
        out.write_bytes(TAG_BREV)?;
        out.write_uint(self.sort_reversed, SORT_REVERSED_WIDTH)?;

        for column in &self.columns {
            let column_len = Encoding::Utf16Be.encoded_len(column) as u64;
            out.write_bytes(TAG_OVCT)?;
            out.write_uint(column_len + OVCT_OVERHEAD, LENGTH_WIDTH)?;
            out.write_bytes(TAG_TVCN)?;
            out.write_uint(column_len, LENGTH_WIDTH)?;
            out.write_text(column, Encoding::Utf16Be)?;
            out.write_bytes(TAG_TVCW)?;
            out.write_uint(COLUMN_WIDTH_VALUE, LENGTH_WIDTH)?;
            out.write_bytes(&[0x00])?;
            out.write_literal("0", Encoding::Ascii)?;
        }

        for track in &self.tracks {
            let track_len = Encoding::Utf16Be.encoded_len(track) as u64;
            out.write_bytes(TAG_OTRK)?;
            out.write_uint(track_len + OTRK_OVERHEAD, LENGTH_WIDTH)?;
            out.write_bytes(TAG_PTRK)?;
            out.write_uint(track_len, LENGTH_WIDTH)?;
            out.write_text(track, Encoding::Utf16Be)?;
        }

        out.flush()
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Load a `.crate` file, naming the record after the file.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))?;
        let name = Self::name_from_file_name(file_name).unwrap_or(file_name);

        let file = File::open(path)?;
        let record = Self::decode(name, BufReader::new(file))
            .map_err(|e| StorageError::format(name, e))?;
        tracing::debug!(
            crate_name = %record.name,
            tracks = record.tracks.len(),
            "Loaded crate {}",
            path.display()
        );
        Ok(record)
    }

    /// Write `<dir>/<name>.crate`, returning the written path.
    ///
    /// The body is encoded in memory first so a failed encode leaves no file.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, StorageError> {
        let bytes = self
            .to_bytes()
            .map_err(|e| StorageError::format(self.name.as_str(), e))?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, bytes)?;
        tracing::debug!(
            crate_name = %self.name,
            tracks = self.tracks.len(),
            "Wrote crate {}",
            path.display()
        );
        Ok(path)
    }
}

impl fmt::Display for CrateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn read_column<R: Read>(stream: &mut InputStream<R>) -> Result<String, FormatError> {
    let section_len = stream.read_uint(LENGTH_WIDTH)?;
    stream.expect_bytes(TAG_TVCN)?;
    let name_len = stream.read_uint(LENGTH_WIDTH)?;
    check_overhead("ovct", "tvcn", section_len, name_len, OVCT_OVERHEAD)?;
    let column = stream.read_text(to_usize(name_len)?, Encoding::Utf16Be)?;
    stream.expect_bytes(TAG_TVCW)?;
    let width = stream.read_uint(LENGTH_WIDTH)?;
    if width != COLUMN_WIDTH_VALUE {
        return Err(FormatError::InvariantViolation(format!(
            "expected tvcw to be {}, found {}",
            COLUMN_WIDTH_VALUE, width
        )));
    }
    stream.expect_bytes(&[0x00])?;
    stream.expect_literal("0", Encoding::Ascii)?;
    Ok(column)
}

fn read_sort<R: Read>(stream: &mut InputStream<R>) -> Result<(String, u64), FormatError> {
    let section_len = stream.read_uint(LENGTH_WIDTH)?;
    stream.expect_bytes(TAG_TVCN)?;
    let key_len = stream.read_uint(LENGTH_WIDTH)?;
    check_overhead("osrt", "tvcn", section_len, key_len, OSRT_OVERHEAD)?;
    let sort_key = stream.read_text(to_usize(key_len)?, Encoding::Utf16Be)?;
    stream.expect_bytes(TAG_BREV)?;
    let sort_reversed = stream.read_uint(SORT_REVERSED_WIDTH)?;
    Ok((sort_key, sort_reversed))
}

fn read_track<R: Read>(stream: &mut InputStream<R>) -> Result<String, FormatError> {
    let section_len = stream.read_uint(LENGTH_WIDTH)?;
    stream.expect_bytes(TAG_PTRK)?;
    let path_len = stream.read_uint(LENGTH_WIDTH)?;
    check_overhead("otrk", "ptrk", section_len, path_len, OTRK_OVERHEAD)?;
    stream.read_text(to_usize(path_len)?, Encoding::Utf16Be)
}

fn check_overhead(
    outer: &str,
    inner: &str,
    outer_len: u64,
    inner_len: u64,
    expected: u64,
) -> Result<(), FormatError> {
    if outer_len.checked_sub(inner_len) != Some(expected) {
        return Err(FormatError::InvariantViolation(format!(
            "expected ({} - {}) to be {}, found {} - {}",
            outer, inner, expected, outer_len, inner_len
        )));
    }
    Ok(())
}

fn to_usize(len: u64) -> Result<usize, FormatError> {
    usize::try_from(len).map_err(|_| {
        FormatError::InvariantViolation(format!("length {} exceeds addressable memory", len))
    })
}

fn unknown_section(offset: u64, tag: &[u8; 4]) -> FormatError {
    FormatError::UnknownSection {
        offset,
        tag: String::from_utf8_lossy(tag).into_owned(),
    }
}
