//! Byte media backing a [`Cursor`](crate::Cursor)
//!
//! A medium is random-access storage addressed by absolute offset. There is
//! no caching layer: each call maps to one read or write on the backing store.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;

use crate::error::AccessError;
use crate::window::ByteWindow;

/// Medium shared between a cursor and all of its forks
pub type SharedMedium = Rc<RefCell<dyn Medium>>;

/// Random-access byte storage.
pub trait Medium {
    /// Fill `buf` with the bytes at `offset`, failing if the full range is unavailable
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), AccessError>;

    /// Store `bytes` at `offset`, failing if the full range is not accepted
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), AccessError>;

    /// Size in bytes, if the medium has a fixed size
    fn len(&self) -> Option<u64>;

    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// File-backed medium.
///
/// Each read or write is one seek plus exactly one `read`/`write` call. A
/// short transfer is reported as an error instead of being retried.
#[derive(Debug)]
pub struct FileMedium {
    file: File,
}

impl FileMedium {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Open an existing file for reading and writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AccessError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Open an existing file for reading only; writes will fail
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, AccessError> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Medium for FileMedium {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), AccessError> {
        self.file.seek(SeekFrom::Start(offset))?;
        let got = self.file.read(buf)?;
        if got < buf.len() {
            return Err(AccessError::ShortRead {
                offset,
                wanted: buf.len(),
                got,
            });
        }
        Ok(())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), AccessError> {
        self.file.seek(SeekFrom::Start(offset))?;
        let written = self.file.write(bytes)?;
        if written < bytes.len() {
            return Err(AccessError::ShortWrite {
                offset,
                wanted: bytes.len(),
                written,
            });
        }
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        self.file.metadata().ok().map(|m| m.len())
    }
}

/// Fixed-size in-memory image (e.g. a ROM dump loaded with `std::fs::read`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMedium {
    bytes: Vec<u8>,
}

impl MemoryMedium {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    fn span(&self, offset: u64, len: usize) -> Result<std::ops::Range<usize>, AccessError> {
        let out_of_range = || AccessError::OutOfRange {
            offset,
            len,
            size: self.bytes.len() as u64,
        };
        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let end = start.checked_add(len).ok_or_else(out_of_range)?;
        if end > self.bytes.len() {
            return Err(out_of_range());
        }
        Ok(start..end)
    }
}

impl Medium for MemoryMedium {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), AccessError> {
        let span = self.span(offset, buf.len())?;
        buf.copy_from_slice(&self.bytes[span]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), AccessError> {
        let span = self.span(offset, bytes.len())?;
        self.bytes[span].copy_from_slice(bytes);
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }
}

/// A window never runs short: holes read as the fill byte.
impl Medium for ByteWindow {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), AccessError> {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.get(offset + i as u64);
        }
        Ok(())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), AccessError> {
        self.set_bytes(offset, bytes);
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        None
    }
}
