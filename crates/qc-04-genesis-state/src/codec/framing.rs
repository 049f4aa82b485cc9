//! # Record Framing
//!
//! Byte layout of chunked genesis parts, independent of what a record holds.
//!
//! ```text
//! [4B LE length][Params payload]
//! [8B LE u64: record count]          -- 0 until the export finalizes
//! repeated:
//!   [4B LE length][GenesisAccount payload]
//! ```
//!
//! No compression, checksum or version tag. The file name implies the format.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

use crate::domain::{GenesisError, IntegrityError};

/// Size of the record length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the record count field that follows the params record.
pub const COUNT_FIELD_SIZE: usize = 8;

/// Framing-level read failure, before a file path is attached.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Attach the file the bytes came from.
    pub fn at(self, path: &Path) -> GenesisError {
        match self {
            FrameError::ShortRead {
                offset,
                expected,
                actual,
            } => IntegrityError::ShortRead {
                path: path.to_path_buf(),
                offset,
                expected,
                actual,
            }
            .into(),
            FrameError::Io(source) => GenesisError::io(path, source),
        }
    }
}

/// Position of the header inside a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    /// Byte offset of the 8-byte count field.
    pub count_offset: u64,
    /// Header length (params record plus count field).
    pub len: u64,
}

/// Write one `[u32 LE len][payload]` record. Returns the bytes written.
pub fn write_record<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> io::Result<usize> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("record payload of {} bytes exceeds u32 length prefix", payload.len()),
        )
    })?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(payload)?;
    Ok(LENGTH_PREFIX_SIZE + payload.len())
}

/// Write the params record followed by a zero record count.
pub fn write_header<W: Write + ?Sized>(
    writer: &mut W,
    params_payload: &[u8],
) -> io::Result<HeaderLayout> {
    let params_len = write_record(writer, params_payload)? as u64;
    writer.write_all(&0u64.to_le_bytes())?;

    Ok(HeaderLayout {
        count_offset: params_len,
        len: params_len + COUNT_FIELD_SIZE as u64,
    })
}

/// Overwrite the count field at `offset` with `count`.
pub fn patch_count<F: Write + Seek + ?Sized>(file: &mut F, offset: u64, count: u64) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&count.to_le_bytes())?;
    file.flush()
}

/// Read exactly `expected` bytes, looping over partial reads.
///
/// A read returning zero bytes before `expected` is reached is a short read.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, expected: usize) -> Result<Vec<u8>, FrameError> {
    let mut buf = vec![0u8; expected];
    let mut filled = 0;

    while filled < expected {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(FrameError::ShortRead {
                    offset: 0,
                    expected: expected as u64,
                    actual: filled as u64,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }

    Ok(buf)
}

/// Cursor over an in-memory part.
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.remaining() < n {
            return Err(FrameError::ShortRead {
                offset: self.pos as u64,
                expected: n as u64,
                actual: self.remaining() as u64,
            });
        }

        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read one length-prefixed record and return its payload.
    pub fn read_record(&mut self) -> Result<&'a [u8], FrameError> {
        let mut len = [0u8; LENGTH_PREFIX_SIZE];
        len.copy_from_slice(self.take(LENGTH_PREFIX_SIZE)?);
        self.take(u32::from_le_bytes(len) as usize)
    }

    /// Read the 8-byte record count.
    pub fn read_count(&mut self) -> Result<u64, FrameError> {
        let mut count = [0u8; COUNT_FIELD_SIZE];
        count.copy_from_slice(self.take(COUNT_FIELD_SIZE)?);
        Ok(u64::from_le_bytes(count))
    }
}
