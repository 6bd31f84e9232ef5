//! Bit-field extract/pack helpers
//!
//! Packed formats (BGR555 colors, OAM attributes, tile map entries) store
//! several small fields in one integer. [`Bitmask`] pulls one field out;
//! [`BitmaskMerge`] packs several back in.

/// Mask plus right shift: `apply(v) = (v & mask) >> shift`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitmask {
    mask: u32,
    shift: u32,
}

impl Bitmask {
    pub const fn new(mask: u32, shift: u32) -> Self {
        Self { mask, shift }
    }

    /// Mask covering bits `lo..=hi`, shifted down by `lo`
    pub const fn for_bit_range(lo: u32, hi: u32) -> Self {
        assert!(lo <= hi && hi < 32, "bit range must satisfy lo <= hi < 32");
        let width = hi - lo + 1;
        let ones = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
        Self {
            mask: ones << lo,
            shift: lo,
        }
    }

    /// Single bit `n`
    pub const fn for_bit(n: u32) -> Self {
        Self::for_bit_range(n, n)
    }

    pub const fn mask(&self) -> u32 {
        self.mask
    }

    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Extract the field from `value`
    pub const fn apply(&self, value: u32) -> u32 {
        (value & self.mask) >> self.shift
    }

    /// Pack `field` into its position, leaving bits outside the mask zero
    pub const fn place(&self, field: u32) -> u32 {
        (field << self.shift) & self.mask
    }

    /// Replace this field inside `value`
    pub const fn insert(&self, value: u32, field: u32) -> u32 {
        (value & !self.mask) | self.place(field)
    }
}

/// Accumulates fields into one integer: `result |= (value << shift) & mask`.
///
/// Masks are expected to be disjoint. Overlapping masks are OR-combined,
/// which is well defined but rarely what a format wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmaskMerge {
    result: u32,
}

impl BitmaskMerge {
    pub const fn new() -> Self {
        Self { result: 0 }
    }

    /// Start from existing bits (e.g. reserved bits that must survive)
    pub const fn from_bits(result: u32) -> Self {
        Self { result }
    }

    #[must_use]
    pub const fn with(self, mask: Bitmask, value: u32) -> Self {
        Self {
            result: self.result | mask.place(value),
        }
    }

    pub fn push(&mut self, mask: Bitmask, value: u32) {
        self.result |= mask.place(value);
    }

    pub const fn result(&self) -> u32 {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_range_roundtrip() {
        for (lo, hi) in [(0u32, 4u32), (5, 9), (10, 14), (15, 15), (0, 31), (31, 31)] {
            let bm = Bitmask::for_bit_range(lo, hi);
            let width = hi - lo + 1;
            let max = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
            for v in [0, 1, max / 2, max] {
                assert_eq!(bm.apply(v << lo), v, "lo={lo} hi={hi} v={v}");
            }
        }
    }

    #[test]
    fn test_for_bit() {
        let bm = Bitmask::for_bit(3);
        assert_eq!(bm.mask(), 0b1000);
        assert_eq!(bm.shift(), 3);
        assert_eq!(bm.apply(0b1010), 1);
        assert_eq!(bm.apply(0b0110), 0);
    }

    #[test]
    fn test_bgr555_unpack_and_merge() {
        let red = Bitmask::for_bit_range(0, 4);
        let green = Bitmask::for_bit_range(5, 9);
        let blue = Bitmask::for_bit_range(10, 14);

        let color = 0x7C1F; // magenta
        assert_eq!(red.apply(color), 31);
        assert_eq!(green.apply(color), 0);
        assert_eq!(blue.apply(color), 31);

        let packed = BitmaskMerge::new()
            .with(blue, 31)
            .with(red, 31)
            .with(green, 0)
            .result();
        assert_eq!(packed, color);

        let mut merge = BitmaskMerge::new();
        merge.push(red, 31);
        merge.push(blue, 31);
        assert_eq!(merge.result(), packed);
    }

    #[test]
    fn test_merge_truncates_to_mask() {
        let low = Bitmask::for_bit_range(0, 3);
        assert_eq!(BitmaskMerge::new().with(low, 0xFF).result(), 0x0F);
    }

    #[test]
    fn test_insert_preserves_other_bits() {
        let mid = Bitmask::for_bit_range(4, 7);
        assert_eq!(mid.insert(0xFFFF, 0x3), 0xFF3F);
    }
}
