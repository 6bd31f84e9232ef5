//! Engine entry point: codecs, structures and configuration

use hashbrown::HashMap;

use crate::codec::{CodecRegistry, TypeKey};
use crate::config::ConfigProvider;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::layout::Structure;
use crate::pipeline::{DynStructure, ReadPipe, StructureEntry, StructurePipe, WritePipe};

/// Everything a pipeline needs besides the bytes.
///
/// Holds the codec registry, the structures registered for nesting and the
/// configuration used by offset expressions. Set it up once, then share it
/// read-only across reads and writes.
pub struct HexContext {
    codecs: CodecRegistry,
    structures: HashMap<TypeKey, Box<dyn DynStructure>>,
    config: Box<dyn ConfigProvider>,
}

impl HexContext {
    /// Context with an empty codec registry
    pub fn new(config: impl ConfigProvider + 'static) -> Self {
        Self {
            codecs: CodecRegistry::new(),
            structures: HashMap::new(),
            config: Box::new(config),
        }
    }

    /// Context with the integer and pointer codecs already registered
    pub fn with_primitives(config: impl ConfigProvider + 'static) -> Self {
        Self {
            codecs: CodecRegistry::with_primitives(),
            ..Self::new(config)
        }
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    /// Allow `T` to be embedded in, or pointed at by, other layouts.
    ///
    /// Fields of a registered structure type with no codec are decoded by
    /// running `T`'s layout on a fresh default value.
    pub fn register_structure<T: Structure + Default>(&mut self) -> &mut Self {
        let entry: Box<dyn DynStructure> = Box::new(StructureEntry::<T>::new());
        let key = entry.type_key();
        if self.structures.insert(key, entry).is_some() {
            tracing::warn!(structure = %key, "structure registered twice, replacing");
        } else {
            tracing::debug!(structure = %key, "registered structure");
        }
        self
    }

    /// Whether values of `key` can be materialized: a codec resolves for it
    /// (ambiguity counts as not decodable) or it is a registered structure.
    pub fn is_decodable(&self, key: TypeKey) -> bool {
        matches!(self.codecs.resolve(key), Ok(Some(_))) || self.structures.contains_key(&key)
    }

    pub(crate) fn structure(&self, key: TypeKey) -> Option<&dyn DynStructure> {
        self.structures.get(&key).map(|s| s.as_ref())
    }

    /// Decode a `T` at the cursor position
    pub fn read<T: Structure + Default>(&self, cursor: &Cursor) -> Result<T> {
        let mut value = T::default();
        self.read_into(&mut value, cursor)?;
        Ok(value)
    }

    /// Decode into an existing `T`; fields not in the layout keep their values
    pub fn read_into<T: Structure>(&self, target: &mut T, cursor: &Cursor) -> Result<()> {
        let mut at = cursor.fork();
        match self.registered_pipe::<T>() {
            Some(pipe) => pipe.read(target, &mut at, self),
            None => StructurePipe::<T>::of().read(target, &mut at, self),
        }
    }

    /// Encode `value` at the cursor position.
    ///
    /// Takes `&mut T` because pre-encode hooks and repointing update the value.
    pub fn write<T: Structure>(&self, value: &mut T, cursor: &Cursor) -> Result<()> {
        let mut at = cursor.fork();
        match self.registered_pipe::<T>() {
            Some(pipe) => pipe.write(&mut at, value, self),
            None => StructurePipe::<T>::of().write(&mut at, value, self),
        }
    }

    /// Encoded size of a structure, which is never known up front
    pub fn size_of<T: Structure>(&self) -> Option<u64> {
        match self.registered_pipe::<T>() {
            Some(pipe) => pipe.size_of(),
            None => StructurePipe::<T>::of().size_of(),
        }
    }

    fn registered_pipe<T: Structure>(&self) -> Option<&StructurePipe<T>> {
        self.structures
            .get(&TypeKey::of::<T>())?
            .as_any()
            .downcast_ref::<StructureEntry<T>>()
            .map(StructureEntry::pipe)
    }
}

impl Default for HexContext {
    fn default() -> Self {
        Self::with_primitives(())
    }
}
