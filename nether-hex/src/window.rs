//! Sparse in-memory byte buffer
//!
//! A [`ByteWindow`] maps absolute offsets to bytes. Untouched offsets read as
//! the window's default fill byte. Pipelines use it to stage a record's bytes
//! before flushing them to a medium with [`Cursor::write_window`].
//!
//! [`Cursor::write_window`]: crate::Cursor::write_window

use std::collections::BTreeMap;

/// Sparse offset -> byte mapping with a default fill byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteWindow {
    bytes: BTreeMap<u64, u8>,
    default: u8,
}

impl ByteWindow {
    /// Create an empty window filled with zeros
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty window with a custom fill byte (e.g. `0xFF` for erased flash)
    pub fn with_default(default: u8) -> Self {
        Self {
            bytes: BTreeMap::new(),
            default,
        }
    }

    /// Fill byte returned for unset offsets
    pub fn default_byte(&self) -> u8 {
        self.default
    }

    pub fn set(&mut self, offset: u64, byte: u8) {
        self.bytes.insert(offset, byte);
    }

    /// Set a contiguous run starting at `offset`
    pub fn set_bytes(&mut self, offset: u64, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.bytes.insert(offset + i as u64, b);
        }
    }

    pub fn get(&self, offset: u64) -> u8 {
        self.bytes.get(&offset).copied().unwrap_or(self.default)
    }

    /// Read `len` bytes starting at `offset`, filling holes with the default
    pub fn get_bytes(&self, offset: u64, len: usize) -> Vec<u8> {
        (0..len as u64).map(|i| self.get(offset + i)).collect()
    }

    /// Lowest explicitly set offset
    pub fn min_offset(&self) -> Option<u64> {
        self.bytes.keys().next().copied()
    }

    /// Highest explicitly set offset
    pub fn max_offset(&self) -> Option<u64> {
        self.bytes.keys().next_back().copied()
    }

    /// Distance between the highest and lowest set offsets (0 when empty)
    pub fn range(&self) -> u64 {
        match (self.min_offset(), self.max_offset()) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        }
    }

    /// Number of explicitly set bytes
    pub fn count(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether every offset between min and max is set
    pub fn has_no_holes(&self) -> bool {
        self.count() as u64 == self.range() + 1
    }

    /// Entries in `[from, to)`, keys kept absolute
    pub fn sub_window(&self, from: u64, to: u64) -> ByteWindow {
        let bytes = if from < to {
            self.bytes
                .range(from..to)
                .map(|(&k, &v)| (k, v))
                .collect()
        } else {
            BTreeMap::new()
        };
        ByteWindow {
            bytes,
            default: self.default,
        }
    }

    /// Contiguous runs of set bytes as `(start, bytes)`, in offset order
    pub fn runs(&self) -> Vec<(u64, Vec<u8>)> {
        let mut runs: Vec<(u64, Vec<u8>)> = Vec::new();
        for (&offset, &byte) in &self.bytes {
            match runs.last_mut() {
                Some((start, run)) if *start + run.len() as u64 == offset => run.push(byte),
                _ => runs.push((offset, vec![byte])),
            }
        }
        runs
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Iterate over explicitly set `(offset, byte)` pairs in offset order
    pub fn iter(&self) -> impl Iterator<Item = (u64, u8)> + '_ {
        self.bytes.iter().map(|(&k, &v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut window = ByteWindow::new();
        for (offset, byte) in [(0u64, 0x12u8), (7, 0xAB), (0x8000_0000, 0xFF)] {
            window.set(offset, byte);
            assert_eq!(window.get(offset), byte);
        }
    }

    #[test]
    fn test_untouched_offset_returns_default() {
        let mut window = ByteWindow::with_default(0xFF);
        window.set(2, 0);
        assert_eq!(window.get(0), 0xFF);
        assert_eq!(window.get(3), 0xFF);
        assert_eq!(window.get_bytes(1, 3), vec![0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn test_range_count_and_holes() {
        let mut window = ByteWindow::new();
        assert_eq!(window.range(), 0);
        assert_eq!(window.count(), 0);
        assert!(!window.has_no_holes());

        window.set_bytes(10, &[1, 2, 3]);
        assert_eq!(window.range(), 2);
        assert_eq!(window.count(), 3);
        assert!(window.has_no_holes());

        window.set(20, 9);
        assert_eq!(window.range(), 10);
        assert_eq!(window.count(), 4);
        assert_eq!(window.has_no_holes(), window.count() as u64 == window.range() + 1);
        assert!(!window.has_no_holes());
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = ByteWindow::new();
        a.set(3, 3);
        a.set(1, 1);
        a.set(2, 2);

        let mut b = ByteWindow::new();
        b.set_bytes(1, &[1, 2, 3]);

        assert_eq!(a, b);
        assert!(a.has_no_holes());
    }

    #[test]
    fn test_sub_window_keeps_absolute_keys() {
        let mut window = ByteWindow::new();
        window.set_bytes(0x100, &[0xA, 0xB, 0xC, 0xD]);

        let sub = window.sub_window(0x101, 0x103);
        assert_eq!(sub.count(), 2);
        assert_eq!(sub.min_offset(), Some(0x101));
        assert_eq!(sub.get(0x102), 0xC);
        assert_eq!(sub.get(0x100), 0);

        assert!(window.sub_window(0x103, 0x101).is_empty());
    }

    #[test]
    fn test_runs_split_on_holes() {
        let mut window = ByteWindow::new();
        window.set_bytes(4, &[1, 2]);
        window.set(10, 3);
        window.set(6, 9);

        assert_eq!(window.runs(), vec![(4, vec![1, 2, 9]), (10, vec![3])]);
    }
}
