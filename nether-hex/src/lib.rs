//! Nether-Hex: declarative binary structure codec for ROM data
//!
//! This crate reads and writes typed structures at arbitrary offsets of a
//! random-access byte medium (a ROM file, an in-memory image or a sparse
//! patch). A structure declares where its fields live with offset
//! expressions; pointer fields are followed to their targets and can be
//! relocated on write.
//!
//! # Key Pieces
//!
//! - **Media**: [`FileMedium`], [`MemoryMedium`] and sparse [`ByteWindow`]s
//! - **Cursors**: a shared medium plus an absolute position, cheap to fork
//! - **Codecs**: [`Hexer`] implementations found through a [`CodecRegistry`],
//!   with declared subtype fallback
//! - **Layouts**: [`Structure`] types list [`FieldDescriptor`]s and hooks
//! - **Pipelines**: linear, per-child and conditional composition
//! - **Offsets**: `0x`/`0b`/decimal literals with `${key|default}`
//!   placeholders filled from a [`ConfigProvider`]
//!
//! # Usage
//!
//! ```ignore
//! use nether_hex::{Cursor, FieldDescriptor, HexContext, Layout, Structure};
//!
//! #[derive(Default)]
//! struct Stats {
//!     hp: u16,
//!     level: u8,
//! }
//!
//! impl Structure for Stats {
//!     fn layout() -> Layout<Self> {
//!         Layout::new()
//!             .field(FieldDescriptor::value("hp", "0x0", |s: &mut Self| &mut s.hp))
//!             .field(FieldDescriptor::value("level", "0x2", |s: &mut Self| &mut s.level))
//!     }
//! }
//!
//! let ctx = HexContext::default();
//! let rom = Cursor::open("game.gba")?.fork_at(0x0012_3400);
//! let mut stats: Stats = ctx.read(&rom)?;
//! stats.level += 1;
//! ctx.write(&mut stats, &rom)?;
//! ```
//!
//! Pointer fields hold a [`PointerObject`]. Writing one consults its
//! [`RepointStrategy`]; the default refuses, so rewriting pointer data is
//! always an explicit choice.

mod bitmask;
mod codec;
mod config;
mod context;
mod cursor;
mod error;
mod evaluator;
mod layout;
mod medium;
mod pipeline;
mod pointer;
mod window;

pub use bitmask::{Bitmask, BitmaskMerge};
pub use codec::{CodecRegistry, DynHexer, Hexer, Ordered, RawBytes, ResolvedCodec, TypeKey, U8Hexer};
pub use config::{ConfigError, ConfigProvider, MapConfig, TomlConfig};
pub use context::HexContext;
pub use cursor::Cursor;
pub use error::{AccessError, HexError, Result};
pub use evaluator::{Evaluator, parse_number};
pub use layout::{FieldDescriptor, Hook, Layout, Structure};
pub use medium::{FileMedium, Medium, MemoryMedium, SharedMedium};
pub use pipeline::{
    DoublePipe, FieldStep, ForEachPipe, LinearPipe, ReadPipe, StructurePipe, SwitchPipe, WritePipe,
};
pub use pointer::{Pointer, PointerHexer, PointerObject, Relocate, RepointStrategy};
pub use window::ByteWindow;
