//! Field layouts for decodable structures
//!
//! A structure describes itself with a [`Layout`]: an ordered list of
//! [`FieldDescriptor`]s plus lifecycle hooks. Nothing is discovered at
//! runtime; each field names its offset expression and an accessor.
//!
//! ```ignore
//! impl Structure for MonsterEntry {
//!     fn layout() -> Layout<Self> {
//!         Layout::new()
//!             .field(FieldDescriptor::value("hp", "0x0", |m: &mut Self| &mut m.hp))
//!             .field(FieldDescriptor::value("level", "0x2", |m: &mut Self| &mut m.level))
//!             .field(
//!                 FieldDescriptor::pointer("name", "0x4", |m: &mut Self| &mut m.name)
//!                     .repoint(RepointStrategy::Identity),
//!             )
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;

use crate::codec::TypeKey;
use crate::context::HexContext;
use crate::cursor::Cursor;
use crate::error::{HexError, Result};
use crate::pointer::{ErasedPointerObject, Pointer, PointerObject, RepointStrategy};

/// A type with a statically declared field layout.
///
/// Register it with [`HexContext::register_structure`] to let other layouts
/// embed it or point at it.
pub trait Structure: Any + Sized {
    fn layout() -> Layout<Self>;
}

/// Lifecycle hook: runs with the object, the cursor at the object's address
/// and the context. May read or write through the cursor.
pub type Hook<T> = Box<dyn Fn(&mut T, &mut Cursor, &HexContext) -> anyhow::Result<()>>;

/// Ordered field descriptors and hooks for `T`.
pub struct Layout<T> {
    fields: Vec<FieldDescriptor<T>>,
    post_decode: Vec<Hook<T>>,
    pre_encode: Vec<Hook<T>>,
}

impl<T: 'static> Layout<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            post_decode: Vec::new(),
            pre_encode: Vec::new(),
        }
    }

    /// Append a field; fields are read and written in declaration order
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Hook run once after every field has been decoded
    #[must_use]
    pub fn post_decode<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T, &mut Cursor, &HexContext) -> anyhow::Result<()> + 'static,
    {
        self.post_decode.push(Box::new(hook));
        self
    }

    /// Hook run once before any field is encoded
    #[must_use]
    pub fn pre_encode<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T, &mut Cursor, &HexContext) -> anyhow::Result<()> + 'static,
    {
        self.pre_encode.push(Box::new(hook));
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (Vec<FieldDescriptor<T>>, Vec<Hook<T>>, Vec<Hook<T>>) {
        (self.fields, self.post_decode, self.pre_encode)
    }
}

impl<T: 'static> Default for Layout<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata and accessor for one field of `T`.
pub struct FieldDescriptor<T> {
    name: &'static str,
    declared_type: TypeKey,
    offset: String,
    absolute: bool,
    repoint: RepointStrategy,
    slot: Slot<T>,
}

pub(crate) enum Slot<T> {
    Value(Box<dyn ValueSlot<T>>),
    Pointer {
        pointee: TypeKey,
        slot: Box<dyn PointerSlot<T>>,
    },
}

impl<T: 'static> FieldDescriptor<T> {
    /// Plain field at `offset`, relative to the structure unless marked [`absolute`](Self::absolute)
    pub fn value<F: Any>(
        name: &'static str,
        offset: impl ToString,
        access: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name,
            declared_type: TypeKey::of::<F>(),
            offset: offset.to_string(),
            absolute: false,
            repoint: RepointStrategy::Disabled,
            slot: Slot::Value(Box::new(ValueAccess { access })),
        }
    }

    /// Pointer field: a [`Pointer`] stored at `offset`, the value stored where it points
    pub fn pointer<O: Any>(
        name: &'static str,
        offset: impl ToString,
        access: fn(&mut T) -> &mut PointerObject<O>,
    ) -> Self {
        Self {
            name,
            declared_type: TypeKey::of::<PointerObject<O>>(),
            offset: offset.to_string(),
            absolute: false,
            repoint: RepointStrategy::Disabled,
            slot: Slot::Pointer {
                pointee: TypeKey::of::<O>(),
                slot: Box::new(PointerAccess { access }),
            },
        }
    }

    /// Treat the offset as an absolute address, ignoring the cursor position
    #[must_use]
    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    /// Strategy handed to pointer objects decoded through this field
    #[must_use]
    pub fn repoint(mut self, repoint: RepointStrategy) -> Self {
        self.repoint = repoint;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> TypeKey {
        self.declared_type
    }

    pub fn offset_expr(&self) -> &str {
        &self.offset
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.slot, Slot::Pointer { .. })
    }

    /// Type stored behind the pointer, for pointer fields
    pub fn pointee_type(&self) -> Option<TypeKey> {
        match &self.slot {
            Slot::Pointer { pointee, .. } => Some(*pointee),
            Slot::Value(_) => None,
        }
    }

    pub(crate) fn repoint_strategy(&self) -> &RepointStrategy {
        &self.repoint
    }

    pub(crate) fn slot(&self) -> &Slot<T> {
        &self.slot
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("FieldDescriptor");
        s.field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("offset", &self.offset)
            .field("absolute", &self.absolute);
        if let Slot::Pointer { pointee, .. } = &self.slot {
            s.field("pointee", pointee).field("repoint", &self.repoint);
        }
        s.finish()
    }
}

/// Erased access to a plain field
pub(crate) trait ValueSlot<T> {
    fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn Any;

    fn assign(&self, field: &str, target: &mut T, value: Box<dyn Any>) -> Result<()>;
}

struct ValueAccess<T, F> {
    access: fn(&mut T) -> &mut F,
}

impl<T, F: Any> ValueSlot<T> for ValueAccess<T, F> {
    fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn Any {
        (self.access)(target)
    }

    fn assign(&self, field: &str, target: &mut T, value: Box<dyn Any>) -> Result<()> {
        let value = value.downcast::<F>().map_err(|_| HexError::TypeMismatch {
            field: field.to_string(),
            expected: std::any::type_name::<F>(),
        })?;
        *(self.access)(target) = *value;
        Ok(())
    }
}

/// Erased access to a pointer field
pub(crate) trait PointerSlot<T> {
    fn object_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn ErasedPointerObject;

    fn assign(
        &self,
        field: &str,
        target: &mut T,
        pointer: Pointer,
        value: Box<dyn Any>,
        repoint: RepointStrategy,
    ) -> Result<()>;
}

struct PointerAccess<T, O> {
    access: fn(&mut T) -> &mut PointerObject<O>,
}

impl<T, O: Any> PointerSlot<T> for PointerAccess<T, O> {
    fn object_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn ErasedPointerObject {
        (self.access)(target)
    }

    fn assign(
        &self,
        field: &str,
        target: &mut T,
        pointer: Pointer,
        value: Box<dyn Any>,
        repoint: RepointStrategy,
    ) -> Result<()> {
        let value = value.downcast::<O>().map_err(|_| HexError::TypeMismatch {
            field: field.to_string(),
            expected: std::any::type_name::<O>(),
        })?;
        *(self.access)(target) = PointerObject::new(pointer, *value).with_repoint(repoint);
        Ok(())
    }
}
