//! Read/write pipelines
//!
//! A pipeline walks an object and moves bytes between it and a cursor.
//! Pipes compose:
//!
//! - [`LinearPipe`]: steps in order, with separate read and write lists
//! - [`ForEachPipe`]: a sub-pipe per child object, each on its own fork
//! - [`SwitchPipe`]: the first case whose predicate matches
//! - [`FieldStep`]: one field of a [`Layout`](crate::Layout), plain or pointer
//! - [`StructurePipe`]: a whole layout (fields plus hooks)
//!
//! Any failing step aborts the run. Bytes already written stay written.

mod field;
mod for_each;
mod linear;
mod structure;
mod switch;

#[cfg(test)]
mod tests;

use std::any::Any;
use std::rc::Rc;

pub use field::FieldStep;
pub use for_each::ForEachPipe;
pub use linear::LinearPipe;
pub use structure::StructurePipe;
pub use switch::SwitchPipe;

pub(crate) use structure::{DynStructure, StructureEntry};

use crate::codec::{DynHexer, TypeKey};
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::{HexError, Result};

/// Decodes bytes at the cursor into `target`, in place.
pub trait ReadPipe<T> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()>;
}

/// Encodes `target` at the cursor.
///
/// `target` is mutable so pre-encode hooks can refresh derived fields
/// (counts, checksums) before they are written.
pub trait WritePipe<T> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()>;
}

/// A pipe that works in both directions.
pub trait DoublePipe<T>: ReadPipe<T> + WritePipe<T> {}

impl<T, P: ReadPipe<T> + WritePipe<T> + ?Sized> DoublePipe<T> for P {}

impl<T, P: ReadPipe<T> + ?Sized> ReadPipe<T> for Box<P> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        (**self).read(target, cursor, ctx)
    }
}

impl<T, P: WritePipe<T> + ?Sized> WritePipe<T> for Box<P> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        (**self).write(cursor, target, ctx)
    }
}

impl<T, P: ReadPipe<T> + ?Sized> ReadPipe<T> for Rc<P> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        (**self).read(target, cursor, ctx)
    }
}

impl<T, P: WritePipe<T> + ?Sized> WritePipe<T> for Rc<P> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        (**self).write(cursor, target, ctx)
    }
}

/// Materialize a value of type `key` at `cursor`.
///
/// Decision order: a registered (or supertype-compatible) codec, then a
/// registered structure layout, otherwise [`HexError::NoCodec`].
pub(crate) fn read_value(ctx: &HexContext, key: TypeKey, cursor: &Cursor) -> Result<Box<dyn Any>> {
    if let Some(codec) = ctx.codecs().resolve(key)? {
        return codec.decode_any(cursor);
    }
    if let Some(structure) = ctx.structure(key) {
        return structure.decode_any(ctx, cursor);
    }
    Err(HexError::NoCodec {
        type_name: key.name(),
    })
}

/// Serialize a value of type `key` at `cursor`, same decision order as [`read_value`].
pub(crate) fn write_value(
    ctx: &HexContext,
    key: TypeKey,
    value: &mut dyn Any,
    cursor: &Cursor,
) -> Result<()> {
    if let Some(codec) = ctx.codecs().resolve(key)? {
        return codec.encode_any(value, cursor);
    }
    if let Some(structure) = ctx.structure(key) {
        return structure.encode_any(ctx, value, cursor);
    }
    Err(HexError::NoCodec {
        type_name: key.name(),
    })
}

/// Encoded size of a value if a codec knows it; structures are indeterminate.
pub(crate) fn size_hint(ctx: &HexContext, key: TypeKey, value: &dyn Any) -> Result<Option<u64>> {
    match ctx.codecs().resolve(key)? {
        Some(codec) => codec.size_of_any(value).map(Some),
        None => Ok(None),
    }
}
