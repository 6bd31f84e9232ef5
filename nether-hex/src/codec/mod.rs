//! Codecs ("hexers") and the type-keyed registry
//!
//! A [`Hexer<T>`] turns bytes at a cursor into a `T` and back. The
//! [`CodecRegistry`] stores them type-erased, keyed by [`TypeKey`], and is
//! the single extension point for primitive values (integers, pointers,
//! colors). Structures with a field layout do not need a codec; the pipeline
//! recurses into them instead.

mod primitive;
mod registry;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::cursor::Cursor;
use crate::error::{HexError, Result};

pub use primitive::{Ordered, RawBytes, U8Hexer};
pub use registry::{CodecRegistry, ResolvedCodec};

/// Runtime identity of a value type, with a readable name for errors.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Decode, encode and size-of for one value type.
///
/// Both directions work at the cursor's current position and must not
/// depend on the cursor being advanced afterwards.
pub trait Hexer<T> {
    fn decode(&self, cursor: &Cursor) -> Result<T>;

    fn encode(&self, value: &T, cursor: &Cursor) -> Result<()>;

    /// Encoded size of `value` in bytes
    fn size_of(&self, value: &T) -> u64;
}

/// Type-erased codec as stored in the registry.
pub trait DynHexer {
    /// Type of the values this codec produces and accepts
    fn value_type(&self) -> TypeKey;

    fn decode_any(&self, cursor: &Cursor) -> Result<Box<dyn Any>>;

    fn encode_any(&self, value: &dyn Any, cursor: &Cursor) -> Result<()>;

    fn size_of_any(&self, value: &dyn Any) -> Result<u64>;
}

/// Adapter from a typed [`Hexer`] to [`DynHexer`]
pub(crate) struct Erased<T, H> {
    hexer: H,
    _marker: PhantomData<fn() -> T>,
}

impl<T, H> Erased<T, H> {
    pub(crate) fn new(hexer: H) -> Self {
        Self {
            hexer,
            _marker: PhantomData,
        }
    }
}

fn mismatch<T: Any>() -> HexError {
    HexError::TypeMismatch {
        field: "<codec input>".to_string(),
        expected: std::any::type_name::<T>(),
    }
}

impl<T: Any, H: Hexer<T>> DynHexer for Erased<T, H> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn decode_any(&self, cursor: &Cursor) -> Result<Box<dyn Any>> {
        Ok(Box::new(self.hexer.decode(cursor)?))
    }

    fn encode_any(&self, value: &dyn Any, cursor: &Cursor) -> Result<()> {
        let value = value.downcast_ref::<T>().ok_or_else(mismatch::<T>)?;
        self.hexer.encode(value, cursor)
    }

    fn size_of_any(&self, value: &dyn Any) -> Result<u64> {
        let value = value.downcast_ref::<T>().ok_or_else(mismatch::<T>)?;
        Ok(self.hexer.size_of(value))
    }
}
