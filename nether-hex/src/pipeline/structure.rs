//! Whole-structure pipe built from a layout

use std::any::Any;
use std::rc::Rc;

use super::field::FieldStep;
use super::linear::{HookPipe, LinearPipe};
use super::{ReadPipe, WritePipe};
use crate::codec::TypeKey;
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::{HexError, Result};
use crate::layout::{Layout, Structure};

/// Pipe for a structure's full layout.
///
/// Read: every field in declaration order, then the post-decode hooks.
/// Write: the pre-encode hooks, then every field in declaration order.
pub struct StructurePipe<T> {
    name: &'static str,
    pipe: LinearPipe<T>,
    fields: Vec<Rc<FieldStep<T>>>,
}

impl<T: 'static> StructurePipe<T> {
    pub fn new(layout: Layout<T>) -> Self {
        let (fields, post_decode, pre_encode) = layout.into_parts();
        let fields: Vec<Rc<FieldStep<T>>> =
            fields.into_iter().map(|f| Rc::new(FieldStep::new(f))).collect();

        let mut pipe = LinearPipe::new();
        for step in &fields {
            pipe.push_read(Rc::clone(step));
        }
        pipe.push_read(HookPipe::new(post_decode));

        pipe.push_write(HookPipe::new(pre_encode));
        for step in &fields {
            pipe.push_write(Rc::clone(step));
        }

        Self {
            name: std::any::type_name::<T>(),
            pipe,
            fields,
        }
    }

    /// Field steps in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldStep<T>> {
        self.fields.iter().map(|f| f.as_ref())
    }

    /// Total encoded size of the structure.
    ///
    /// Always `None`: a layout only names field offsets, and the size of
    /// pointed-to or variable-length data cannot be derived from it.
    pub fn size_of(&self) -> Option<u64> {
        None
    }
}

impl<T: Structure> StructurePipe<T> {
    /// Pipe for `T`'s own layout
    pub fn of() -> Self {
        Self::new(T::layout())
    }
}

impl<T: 'static> ReadPipe<T> for StructurePipe<T> {
    fn read(&self, target: &mut T, cursor: &mut Cursor, ctx: &HexContext) -> Result<()> {
        tracing::debug!(structure = self.name, address = cursor.position(), "reading structure");
        self.pipe.read(target, cursor, ctx)
    }
}

impl<T: 'static> WritePipe<T> for StructurePipe<T> {
    fn write(&self, cursor: &mut Cursor, target: &mut T, ctx: &HexContext) -> Result<()> {
        tracing::debug!(structure = self.name, address = cursor.position(), "writing structure");
        self.pipe.write(cursor, target, ctx)
    }
}

/// Type-erased registered structure, used when a field's type has no codec
pub(crate) trait DynStructure {
    fn type_key(&self) -> TypeKey;

    /// Decode a fresh default instance at the cursor
    fn decode_any(&self, ctx: &HexContext, cursor: &Cursor) -> Result<Box<dyn Any>>;

    fn encode_any(&self, ctx: &HexContext, value: &mut dyn Any, cursor: &Cursor) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct StructureEntry<T> {
    pipe: StructurePipe<T>,
}

impl<T: Structure + Default> StructureEntry<T> {
    pub(crate) fn new() -> Self {
        Self {
            pipe: StructurePipe::of(),
        }
    }
}

impl<T> StructureEntry<T> {
    pub(crate) fn pipe(&self) -> &StructurePipe<T> {
        &self.pipe
    }
}

impl<T: Structure + Default> DynStructure for StructureEntry<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn decode_any(&self, ctx: &HexContext, cursor: &Cursor) -> Result<Box<dyn Any>> {
        let mut value = T::default();
        self.pipe.read(&mut value, &mut cursor.fork(), ctx)?;
        Ok(Box::new(value))
    }

    fn encode_any(&self, ctx: &HexContext, value: &mut dyn Any, cursor: &Cursor) -> Result<()> {
        let value = value
            .downcast_mut::<T>()
            .ok_or_else(|| HexError::TypeMismatch {
                field: "<structure>".to_string(),
                expected: std::any::type_name::<T>(),
            })?;
        self.pipe.write(&mut cursor.fork(), value, ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
