//! Codec registry with subtype resolution

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use byteorder::LittleEndian;
use hashbrown::{HashMap, HashSet};

use super::{DynHexer, Erased, Hexer, Ordered, TypeKey, U8Hexer};
use crate::cursor::Cursor;
use crate::error::{HexError, Result};
use crate::pointer::{Pointer, PointerHexer};

/// One declared `sub is-a super` edge with its value conversions
#[derive(Clone, Copy)]
struct Edge {
    sub: TypeKey,
    sup: TypeKey,
    up: fn(&dyn Any) -> Option<Box<dyn Any>>,
    down: fn(Box<dyn Any>) -> Option<Box<dyn Any>>,
}

fn upcast<Sub: Any + Clone, Super: Any + From<Sub>>(value: &dyn Any) -> Option<Box<dyn Any>> {
    let sub = value.downcast_ref::<Sub>()?.clone();
    Some(Box::new(Super::from(sub)))
}

fn downcast<Sub: Any + TryFrom<Super>, Super: Any>(value: Box<dyn Any>) -> Option<Box<dyn Any>> {
    let sup = *value.downcast::<Super>().ok()?;
    Sub::try_from(sup).ok().map(|sub| Box::new(sub) as Box<dyn Any>)
}

/// A codec chosen by [`CodecRegistry::resolve`].
///
/// When the match came from a supertype, values are converted along the
/// declared subtype path on the way in and out.
#[derive(Clone)]
pub struct ResolvedCodec {
    codec: Rc<dyn DynHexer>,
    requested: TypeKey,
    path: Vec<Edge>,
}

impl ResolvedCodec {
    /// Type the codec was registered under
    pub fn registered_type(&self) -> TypeKey {
        self.codec.value_type()
    }

    /// Whether the match was exact rather than through a supertype
    pub fn is_exact(&self) -> bool {
        self.path.is_empty()
    }

    fn to_registered(&self, value: &dyn Any) -> Result<Option<Box<dyn Any>>> {
        let mut current: Option<Box<dyn Any>> = None;
        for edge in &self.path {
            let input: &dyn Any = match &current {
                Some(boxed) => boxed.as_ref(),
                None => value,
            };
            let converted = (edge.up)(input).ok_or_else(|| HexError::TypeMismatch {
                field: "<codec input>".to_string(),
                expected: edge.sub.name(),
            })?;
            current = Some(converted);
        }
        Ok(current)
    }
}

impl DynHexer for ResolvedCodec {
    fn value_type(&self) -> TypeKey {
        self.requested
    }

    fn decode_any(&self, cursor: &Cursor) -> Result<Box<dyn Any>> {
        let mut value = self.codec.decode_any(cursor)?;
        for edge in self.path.iter().rev() {
            value = (edge.down)(value).ok_or_else(|| {
                HexError::InvalidData(format!(
                    "decoded {} does not convert to {}",
                    edge.sup, edge.sub
                ))
            })?;
        }
        Ok(value)
    }

    fn encode_any(&self, value: &dyn Any, cursor: &Cursor) -> Result<()> {
        match self.to_registered(value)? {
            Some(converted) => self.codec.encode_any(converted.as_ref(), cursor),
            None => self.codec.encode_any(value, cursor),
        }
    }

    fn size_of_any(&self, value: &dyn Any) -> Result<u64> {
        match self.to_registered(value)? {
            Some(converted) => self.codec.size_of_any(converted.as_ref()),
            None => self.codec.size_of_any(value),
        }
    }
}

/// Codecs keyed by exact type, plus declared subtype edges.
///
/// Lookup rules:
/// 1. a codec registered for the exact type wins;
/// 2. otherwise every registered type reachable through declared supertype
///    edges is a candidate: none means "no codec", one is used, several is
///    an [`HexError::AmbiguousCodec`] error. The registry never guesses.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<TypeKey, Rc<dyn DynHexer>>,
    edges: HashMap<TypeKey, Vec<Edge>>,
    cache: RefCell<HashMap<TypeKey, Option<ResolvedCodec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with little-endian integers and 32-bit pointers
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        registry.register::<u8, _>(U8Hexer);
        registry.register::<i8, _>(U8Hexer);
        registry.register::<u16, _>(Ordered::<LittleEndian>::new());
        registry.register::<i16, _>(Ordered::<LittleEndian>::new());
        registry.register::<u32, _>(Ordered::<LittleEndian>::new());
        registry.register::<i32, _>(Ordered::<LittleEndian>::new());
        registry.register::<u64, _>(Ordered::<LittleEndian>::new());
        registry.register::<i64, _>(Ordered::<LittleEndian>::new());
        registry.register::<Pointer, _>(PointerHexer::default());
        registry
    }

    /// Register a codec for exactly `T`, replacing any previous one
    pub fn register<T: Any, H: Hexer<T> + 'static>(&mut self, hexer: H) {
        self.register_dyn(Rc::new(Erased::<T, H>::new(hexer)));
    }

    /// Register an already type-erased codec under its own value type
    pub fn register_dyn(&mut self, codec: Rc<dyn DynHexer>) {
        let key = codec.value_type();
        if self.codecs.insert(key, codec).is_some() {
            tracing::warn!(type_name = key.name(), "replacing registered codec");
        }
        self.cache.borrow_mut().clear();
    }

    /// Declare that `Sub` is a `Super`.
    ///
    /// A codec registered for `Super` then serves `Sub` values, converted
    /// with `From`/`TryFrom`. Edges are transitive.
    pub fn declare_subtype<Sub, Super>(&mut self)
    where
        Sub: Any + Clone + TryFrom<Super>,
        Super: Any + From<Sub>,
    {
        let edge = Edge {
            sub: TypeKey::of::<Sub>(),
            sup: TypeKey::of::<Super>(),
            up: upcast::<Sub, Super>,
            down: downcast::<Sub, Super>,
        };
        let edges = self.edges.entry(edge.sub).or_default();
        if !edges.iter().any(|e| e.sup == edge.sup) {
            edges.push(edge);
        }
        self.cache.borrow_mut().clear();
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.codecs.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Find the codec for `key`; `Ok(None)` means no codec applies.
    pub fn resolve(&self, key: TypeKey) -> Result<Option<ResolvedCodec>> {
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let resolved = self.resolve_uncached(key)?;
        self.cache.borrow_mut().insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_uncached(&self, key: TypeKey) -> Result<Option<ResolvedCodec>> {
        if let Some(codec) = self.codecs.get(&key) {
            return Ok(Some(ResolvedCodec {
                codec: Rc::clone(codec),
                requested: key,
                path: Vec::new(),
            }));
        }

        // Breadth-first over supertype edges; first path found to each type is kept
        let mut seen: HashSet<TypeKey> = HashSet::new();
        let mut queue: VecDeque<(TypeKey, Vec<Edge>)> = VecDeque::new();
        let mut candidates: Vec<(TypeKey, Vec<Edge>)> = Vec::new();
        seen.insert(key);
        queue.push_back((key, Vec::new()));

        while let Some((current, path)) = queue.pop_front() {
            for edge in self.edges.get(&current).into_iter().flatten() {
                if !seen.insert(edge.sup) {
                    continue;
                }
                let mut next = path.clone();
                next.push(*edge);
                if self.codecs.contains_key(&edge.sup) {
                    candidates.push((edge.sup, next.clone()));
                }
                queue.push_back((edge.sup, next));
            }
        }

        match candidates.len() {
            0 => Ok(None),
            1 => {
                let (sup, path) = candidates.remove(0);
                tracing::trace!(
                    requested = key.name(),
                    registered = sup.name(),
                    "resolved codec through supertype"
                );
                Ok(Some(ResolvedCodec {
                    codec: Rc::clone(&self.codecs[&sup]),
                    requested: key,
                    path,
                }))
            }
            _ => {
                let mut names: Vec<&'static str> =
                    candidates.iter().map(|(sup, _)| sup.name()).collect();
                names.sort_unstable();
                Err(HexError::AmbiguousCodec {
                    requested: key.name(),
                    candidates: names,
                })
            }
        }
    }
}
