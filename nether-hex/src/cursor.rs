//! Addressable, forkable position over a byte medium

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::codec::Hexer;
use crate::error::{AccessError, Result};
use crate::medium::{FileMedium, Medium, MemoryMedium, SharedMedium};
use crate::window::ByteWindow;

/// Read/write position over a shared medium.
///
/// Reads and writes take a `distance` relative to the current position and
/// never move it; only [`advance_relative`](Self::advance_relative) and
/// [`advance_to`](Self::advance_to) do. Forking copies the position, not the
/// bytes: every fork sees writes made through any other fork.
#[derive(Clone)]
pub struct Cursor {
    medium: SharedMedium,
    position: u64,
}

impl Cursor {
    /// Root cursor at offset 0 over an existing shared medium
    pub fn new(medium: SharedMedium) -> Self {
        Self {
            medium,
            position: 0,
        }
    }

    /// Open a file for reading and writing
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, AccessError> {
        let medium = FileMedium::open(path)?;
        Ok(Self::new(Rc::new(RefCell::new(medium))))
    }

    /// Cursor over a fixed-size in-memory image
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Rc::new(RefCell::new(MemoryMedium::new(bytes))))
    }

    /// Cursor over a sparse window
    pub fn from_window(window: ByteWindow) -> Self {
        Self::new(Rc::new(RefCell::new(window)))
    }

    /// Absolute position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Handle to the underlying medium
    pub fn medium(&self) -> &SharedMedium {
        &self.medium
    }

    /// Independent position over the same medium
    pub fn fork(&self) -> Cursor {
        self.clone()
    }

    /// Fork positioned at an absolute offset
    pub fn fork_at(&self, position: u64) -> Cursor {
        Cursor {
            medium: Rc::clone(&self.medium),
            position,
        }
    }

    /// Fork positioned `delta` bytes from here
    pub fn fork_relative(&self, delta: i64) -> std::result::Result<Cursor, AccessError> {
        Ok(self.fork_at(self.offset_by(delta)?))
    }

    pub fn advance_relative(&mut self, delta: i64) -> std::result::Result<(), AccessError> {
        self.position = self.offset_by(delta)?;
        Ok(())
    }

    pub fn advance_to(&mut self, position: u64) {
        self.position = position;
    }

    /// Read `length` bytes at `distance` from the current position
    pub fn read(&self, distance: i64, length: usize) -> std::result::Result<Vec<u8>, AccessError> {
        let offset = self.offset_by(distance)?;
        let mut buf = vec![0u8; length];
        self.medium.borrow_mut().read_at(offset, &mut buf)?;
        Ok(buf)
    }

    pub fn get_byte(&self, distance: i64) -> std::result::Result<u8, AccessError> {
        let offset = self.offset_by(distance)?;
        let mut buf = [0u8; 1];
        self.medium.borrow_mut().read_at(offset, &mut buf)?;
        Ok(buf[0])
    }

    pub fn get_bytes(&self, distance: i64, count: usize) -> std::result::Result<Vec<u8>, AccessError> {
        self.read(distance, count)
    }

    /// Fill `buf` from `distance` without allocating
    pub fn read_into(&self, distance: i64, buf: &mut [u8]) -> std::result::Result<(), AccessError> {
        let offset = self.offset_by(distance)?;
        self.medium.borrow_mut().read_at(offset, buf)
    }

    /// Write `bytes` at `distance` from the current position
    pub fn write(&self, distance: i64, bytes: &[u8]) -> std::result::Result<(), AccessError> {
        let offset = self.offset_by(distance)?;
        self.medium.borrow_mut().write_at(offset, bytes)
    }

    /// Flush a staged window: each contiguous run lands at `position + distance + key`.
    ///
    /// Holes in the window are left untouched on the medium. A window without
    /// holes is flushed with a single write.
    pub fn write_window(
        &self,
        distance: i64,
        window: &ByteWindow,
    ) -> std::result::Result<(), AccessError> {
        let base = self.offset_by(distance)?;
        let mut medium = self.medium.borrow_mut();
        for (start, run) in window.runs() {
            medium.write_at(base + start, &run)?;
        }
        Ok(())
    }

    /// Decode a value at the current position without moving this cursor
    pub fn decode<T, H: Hexer<T> + ?Sized>(&self, hexer: &H) -> Result<T> {
        hexer.decode(&self.fork())
    }

    /// Encode a value at the current position without moving this cursor
    pub fn encode<T, H: Hexer<T> + ?Sized>(&self, hexer: &H, value: &T) -> Result<()> {
        hexer.encode(value, &self.fork())
    }

    fn offset_by(&self, delta: i64) -> std::result::Result<u64, AccessError> {
        self.position
            .checked_add_signed(delta)
            .ok_or(AccessError::NegativeOffset {
                base: self.position,
                delta,
            })
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &format_args!("{:#x}", self.position))
            .finish_non_exhaustive()
    }
}
