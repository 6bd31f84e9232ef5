//! Per-field steps: offset resolution and pointer indirection

use super::{ReadPipe, WritePipe, read_value, size_hint, write_value};
use crate::codec::{DynHexer, ResolvedCodec, TypeKey};
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::{HexError, Result};
use crate::evaluator::Evaluator;
use crate::layout::{FieldDescriptor, Slot};
use crate::pointer::Pointer;

/// Reads or writes one field described by a [`FieldDescriptor`].
///
/// The field address is `evaluate(offset)` for absolute fields and
/// `position + evaluate(offset)` otherwise. Plain fields are decoded right
/// there. Pointer fields decode a [`Pointer`] there and the value at its
/// target.
pub struct FieldStep<T> {
    field: FieldDescriptor<T>,
}

impl<T> FieldStep<T> {
    pub fn new(field: FieldDescriptor<T>) -> Self {
        Self { field }
    }

    pub fn descriptor(&self) -> &FieldDescriptor<T> {
        &self.field
    }
}

impl<T: 'static> FieldStep<T> {
    /// Absolute address of the field for a structure at `cursor`
    pub fn address(&self, cursor: &Cursor, ctx: &HexContext) -> Result<u64> {
        let expr = self.field.offset_expr();
        let bad_offset = || HexError::BadOffset {
            field: self.field.name().to_string(),
            expr: expr.to_string(),
        };
        let offset = Evaluator::new(ctx.config())
            .offset(expr)
            .ok_or_else(bad_offset)?;

        if self.field.is_absolute() {
            return u64::try_from(offset).map_err(|_| bad_offset());
        }
        Ok(cursor.fork_relative(offset)?.position())
    }

    fn read_at(&self, target: &mut T, at: &Cursor, ctx: &HexContext) -> Result<()> {
        let name = self.field.name();
        match self.field.slot() {
            Slot::Value(slot) => {
                let value = read_value(ctx, self.field.declared_type(), at)?;
                slot.assign(name, target, value)
            }
            Slot::Pointer { pointee, slot } => {
                let pointer = read_pointer(ctx, at)?;
                tracing::trace!(field = name, pointer = %pointer, "following pointer");
                let value = read_value(ctx, *pointee, &at.fork_at(pointer.offset()))?;
                slot.assign(
                    name,
                    target,
                    pointer,
                    value,
                    self.field.repoint_strategy().clone(),
                )
            }
        }
    }

    fn write_at(&self, target: &mut T, at: &Cursor, ctx: &HexContext) -> Result<()> {
        match self.field.slot() {
            Slot::Value(slot) => {
                write_value(ctx, self.field.declared_type(), slot.get_mut(target), at)
            }
            Slot::Pointer { pointee, slot } => {
                let object = slot.object_mut(target);
                let old = object.pointer();
                let hint = size_hint(ctx, *pointee, object.value_any_mut())?;

                // Must fail before anything is written for this field
                let new = object
                    .repoint_strategy()
                    .clone()
                    .repoint(old, object.value_any_mut(), hint)?;
                if new != old {
                    tracing::debug!(field = self.field.name(), from = %old, to = %new, "repointed");
                }
                object.set_pointer(new);

                write_pointer(ctx, &new, at)?;
                write_value(ctx, *pointee, object.value_any_mut(), &at.fork_at(new.offset()))
            }
        }
    }
}

impl<T: 'static> ReadPipe<T> for FieldStep<T> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        let address = self
            .address(cursor, ctx)
            .map_err(|e| e.in_field(self.field.name(), cursor.position()))?;
        tracing::trace!(field = self.field.name(), address, "read field");
        self.read_at(target, &cursor.fork_at(address), ctx)
            .map_err(|e| e.in_field(self.field.name(), address))
    }
}

impl<T: 'static> WritePipe<T> for FieldStep<T> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        let address = self
            .address(cursor, ctx)
            .map_err(|e| e.in_field(self.field.name(), cursor.position()))?;
        tracing::trace!(field = self.field.name(), address, "write field");
        self.write_at(target, &cursor.fork_at(address), ctx)
            .map_err(|e| e.in_field(self.field.name(), address))
    }
}

fn pointer_codec(ctx: &HexContext) -> Result<ResolvedCodec> {
    ctx.codecs()
        .resolve(TypeKey::of::<Pointer>())?
        .ok_or(HexError::NoCodec {
            type_name: std::any::type_name::<Pointer>(),
        })
}

fn read_pointer(ctx: &HexContext, at: &Cursor) -> Result<Pointer> {
    let value = pointer_codec(ctx)?.decode_any(at)?;
    value
        .downcast::<Pointer>()
        .map(|pointer| *pointer)
        .map_err(|_| HexError::TypeMismatch {
            field: "<pointer codec output>".to_string(),
            expected: std::any::type_name::<Pointer>(),
        })
}

fn write_pointer(ctx: &HexContext, pointer: &Pointer, at: &Cursor) -> Result<()> {
    pointer_codec(ctx)?.encode_any(pointer, at)
}
