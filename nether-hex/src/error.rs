//! Error types
//!
//! Two layers:
//! - [`AccessError`]: the medium could not supply or accept a byte range.
//!   These are data conditions; a caller may abort or substitute a default.
//! - [`HexError`]: a pipeline run failed. Some variants wrap data conditions,
//!   others signal a setup defect (see [`HexError::is_setup_defect`]).

use crate::pointer::Pointer;

/// Failure to read or write a byte range on a medium.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Fewer bytes came back than were requested
    #[error("short read at {offset:#x}: wanted {wanted} bytes, got {got}")]
    ShortRead { offset: u64, wanted: usize, got: usize },

    /// Fewer bytes were accepted than were written
    #[error("short write at {offset:#x}: wrote {written} of {wanted} bytes")]
    ShortWrite {
        offset: u64,
        wanted: usize,
        written: usize,
    },

    /// Range lies outside a fixed-size medium
    #[error("range {offset:#x}+{len} is outside medium of {size:#x} bytes")]
    OutOfRange { offset: u64, len: usize, size: u64 },

    /// Relative arithmetic produced an address below zero
    #[error("address {base:#x}{delta:+} is negative")]
    NegativeOffset { base: u64, delta: i64 },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a codec or pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum HexError {
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Offset expression did not evaluate to a number
    #[error("field `{field}`: offset expression {expr:?} is not a number")]
    BadOffset { field: String, expr: String },

    /// Bytes were readable but do not form a valid value
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// More than one registered supertype codec matches
    #[error("ambiguous codec for {requested}: candidates are {}", candidates.join(", "))]
    AmbiguousCodec {
        requested: &'static str,
        candidates: Vec<&'static str>,
    },

    /// Neither a codec nor a registered structure exists for the type
    #[error("no codec registered for {type_name} and it is not a decodable structure")]
    NoCodec { type_name: &'static str },

    /// A pointer object was written under the `Disabled` repoint strategy
    #[error("repointing is disabled for pointer {pointer}")]
    RepointDisabled { pointer: Pointer },

    /// A value handed to a field or codec had the wrong concrete type
    #[error("field `{field}`: expected a value of type {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    /// A lifecycle hook returned an error
    #[error("hook failed: {0:#}")]
    Hook(#[source] anyhow::Error),

    /// Context wrapper naming the field being processed
    #[error("field `{field}` at {address:#x}: {source}")]
    Field {
        field: String,
        address: u64,
        #[source]
        source: Box<HexError>,
    },
}

impl HexError {
    /// Wrap this error with the field it occurred in.
    pub fn in_field(self, field: &str, address: u64) -> Self {
        HexError::Field {
            field: field.to_string(),
            address,
            source: Box::new(self),
        }
    }

    /// Whether this error indicates a setup defect rather than bad data.
    ///
    /// Ambiguous or missing codecs, disabled repointing, type mismatches and
    /// hook failures all mean the context or layout is wrong; retrying with
    /// different bytes will not help.
    pub fn is_setup_defect(&self) -> bool {
        match self {
            HexError::AmbiguousCodec { .. }
            | HexError::NoCodec { .. }
            | HexError::RepointDisabled { .. }
            | HexError::TypeMismatch { .. }
            | HexError::Hook(_) => true,
            HexError::Field { source, .. } => source.is_setup_defect(),
            HexError::Access(_) | HexError::BadOffset { .. } | HexError::InvalidData(_) => false,
        }
    }

    /// Innermost error, skipping field context wrappers.
    pub fn root(&self) -> &HexError {
        match self {
            HexError::Field { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, HexError>;
