//! Pointers, pointer objects and repoint strategies
//!
//! A [`Pointer`] is where something lives in the medium. A
//! [`PointerObject`] owns a value together with the pointer it was read
//! through; writing it back asks its [`RepointStrategy`] where the value
//! should go now.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::codec::Hexer;
use crate::cursor::Cursor;
use crate::error::{HexError, Result};

/// Absolute offset into the medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pointer {
    offset: u64,
}

impl Pointer {
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl From<u64> for Pointer {
    fn from(offset: u64) -> Self {
        Self { offset }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#08x}", self.offset)
    }
}

/// Little-endian 32-bit pointer codec with a mapped base address.
///
/// Cartridge ROM on the GBA is mapped at `0x0800_0000`, so a stored
/// `0x0800_0200` refers to file offset `0x200`. The default base is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerHexer {
    base: u32,
}

impl PointerHexer {
    /// GBA cartridge ROM mapping
    pub const GBA_ROM_BASE: u32 = 0x0800_0000;

    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    pub const fn base(&self) -> u32 {
        self.base
    }
}

impl Hexer<Pointer> for PointerHexer {
    fn decode(&self, cursor: &Cursor) -> Result<Pointer> {
        let mut buf = [0u8; 4];
        cursor.read_into(0, &mut buf)?;
        let raw = u32::from_le_bytes(buf);
        let offset = raw.checked_sub(self.base).ok_or_else(|| {
            HexError::InvalidData(format!(
                "pointer {raw:#010x} lies below mapped base {:#010x}",
                self.base
            ))
        })?;
        Ok(Pointer::new(u64::from(offset)))
    }

    fn encode(&self, value: &Pointer, cursor: &Cursor) -> Result<()> {
        let raw = u32::try_from(value.offset())
            .ok()
            .and_then(|offset| offset.checked_add(self.base))
            .ok_or_else(|| {
                HexError::InvalidData(format!(
                    "pointer {value} does not fit in 32 bits above base {:#010x}",
                    self.base
                ))
            })?;
        Ok(cursor.write(0, &raw.to_le_bytes())?)
    }

    fn size_of(&self, _value: &Pointer) -> u64 {
        4
    }
}

/// Relocation policy hook for [`RepointStrategy::Custom`].
///
/// Implementations decide where a value should be written, given where it
/// was read from and (if known) how many bytes its encoding takes.
pub trait Relocate {
    fn relocate(&self, old: Pointer, value: &dyn Any, size_hint: Option<u64>) -> Result<Pointer>;
}

/// Write-time relocation policy for a [`PointerObject`].
#[derive(Clone, Default)]
pub enum RepointStrategy {
    /// Always fail. Writing relocatable data has to be opted into.
    #[default]
    Disabled,
    /// Keep the old pointer. The new encoding must fit the old slot; nothing
    /// checks this, an oversized value overwrites whatever follows it.
    Identity,
    /// Caller-supplied policy, e.g. a free-space allocator.
    Custom(Rc<dyn Relocate>),
}

impl RepointStrategy {
    pub fn custom(relocate: impl Relocate + 'static) -> Self {
        RepointStrategy::Custom(Rc::new(relocate))
    }

    /// Pointer to write `value` at
    pub fn repoint(&self, old: Pointer, value: &dyn Any, size_hint: Option<u64>) -> Result<Pointer> {
        match self {
            RepointStrategy::Disabled => Err(HexError::RepointDisabled { pointer: old }),
            RepointStrategy::Identity => Ok(old),
            RepointStrategy::Custom(relocate) => relocate.relocate(old, value, size_hint),
        }
    }
}

impl fmt::Debug for RepointStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepointStrategy::Disabled => f.write_str("Disabled"),
            RepointStrategy::Identity => f.write_str("Identity"),
            RepointStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A value owned together with the pointer it currently lives at.
#[derive(Debug, Clone, Default)]
pub struct PointerObject<O> {
    pointer: Pointer,
    value: O,
    repoint: RepointStrategy,
}

impl<O> PointerObject<O> {
    pub fn new(pointer: Pointer, value: O) -> Self {
        Self {
            pointer,
            value,
            repoint: RepointStrategy::Disabled,
        }
    }

    #[must_use]
    pub fn with_repoint(mut self, repoint: RepointStrategy) -> Self {
        self.repoint = repoint;
        self
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: Pointer) {
        self.pointer = pointer;
    }

    pub fn value(&self) -> &O {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut O {
        &mut self.value
    }

    pub fn into_value(self) -> O {
        self.value
    }

    pub fn repoint_strategy(&self) -> &RepointStrategy {
        &self.repoint
    }

    pub fn set_repoint_strategy(&mut self, repoint: RepointStrategy) {
        self.repoint = repoint;
    }
}

/// Pointer objects compare by pointer and value; the strategy is policy, not data.
impl<O: PartialEq> PartialEq for PointerObject<O> {
    fn eq(&self, other: &Self) -> bool {
        self.pointer == other.pointer && self.value == other.value
    }
}

/// Type-erased view of a [`PointerObject`] used by the pointer field step
pub(crate) trait ErasedPointerObject {
    fn pointer(&self) -> Pointer;
    fn set_pointer(&mut self, pointer: Pointer);
    fn repoint_strategy(&self) -> &RepointStrategy;
    fn value_any_mut(&mut self) -> &mut dyn Any;
}

impl<O: Any> ErasedPointerObject for PointerObject<O> {
    fn pointer(&self) -> Pointer {
        self.pointer
    }

    fn set_pointer(&mut self, pointer: Pointer) {
        self.pointer = pointer;
    }

    fn repoint_strategy(&self) -> &RepointStrategy {
        &self.repoint
    }

    fn value_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}
