//! Error types for vector tile decoding and building.

use thiserror::Error;

use crate::model::value::ValueKind;

/// Error while reading the protobuf-level structure of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed varint while reading {context} (more than 10 bytes, overlong value, or truncated)")]
    MalformedVarint { context: &'static str },

    #[error("unknown wire type {wire_type} for field {field}")]
    UnknownWireType { field: u32, wire_type: u8 },

    #[error("invalid field number in tag")]
    InvalidFieldNumber,

    #[error("message truncated while reading {context}")]
    TruncatedMessage { context: &'static str },

    #[error("feature tag list has an odd number of entries")]
    MalformedPropertyTags,

    #[error("{table} index {index} out of range (size {size})")]
    IndexOutOfRange {
        table: &'static str,
        index: u32,
        size: u32,
    },

    #[error("invalid property value: {context}")]
    InvalidPropertyValue { context: &'static str },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("unsupported layer version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("layer is missing its required {field} field")]
    MissingField { field: &'static str },

    #[error("invalid geometry type {value}")]
    InvalidGeometryType { value: u64 },
}

/// Error while decoding a geometry command stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("invalid geometry command {command} with count {count}")]
    InvalidCommand { command: u32, count: u32 },

    #[error("invalid command sequence: {context}")]
    InvalidSequence { context: &'static str },

    #[error("trailing data after geometry")]
    TrailingData,

    #[error("geometry stream ended unexpectedly")]
    UnexpectedEnd,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Error from a direct accessor applied to the wrong value variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("expected {expected} value, found {actual}")]
    VariantMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },
}

/// Error from a builder call that violates the feature state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("invalid geometry state: {context}")]
    InvalidGeometryState { context: &'static str },

    #[error("feature already committed")]
    AlreadyCommitted,
}
