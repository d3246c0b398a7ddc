//! Error types for the entity I/O core
//!
//! Nothing in the I/O graph propagates errors as panics: a bad connection,
//! an unknown input, or a failed spawn is logged and the rest of the graph
//! keeps processing. These types exist so call sites can decide how loudly
//! to log and so tests can assert on failure modes.

use crate::variant::FieldType;

/// Errors from parsing entity keyvalue text blocks
#[derive(Debug, thiserror::Error)]
pub enum KeyValuesError {
    /// A block was opened with `{` but never closed
    #[error("unterminated entity block starting at line {0}")]
    UnterminatedBlock(usize),

    /// A quoted string ran to end of input
    #[error("unterminated quoted string at line {0}")]
    UnterminatedString(usize),

    /// Something other than `{`, `}` or a quoted string appeared
    #[error("unexpected token {token:?} at line {line}")]
    UnexpectedToken { line: usize, token: char },

    /// A key had no value before the block closed
    #[error("key {0:?} has no value at line {1}")]
    MissingValue(String, usize),
}

/// Errors from parsing a single I/O connection string
#[derive(Debug, thiserror::Error)]
pub enum ConnectionParseError {
    /// Fewer than the required fields were present
    #[error("connection string has {found} fields, expected at least 4: {raw:?}")]
    TooFewFields { raw: String, found: usize },

    /// The delay field did not parse as a number
    #[error("bad delay {0:?} in connection string")]
    BadDelay(String),

    /// The fire-count field did not parse as an integer
    #[error("bad fire count {0:?} in connection string")]
    BadFireCount(String),
}

/// Errors from delivering an input to an entity
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The target class declares no input by this name
    #[error("entity class {classname:?} has no input {input:?}")]
    UnknownInput { classname: String, input: String },

    /// The parameter could not be coerced to the declared type
    #[error("input {input:?} expects {expected:?}, got {got:?}")]
    TypeMismatch {
        input: String,
        expected: FieldType,
        got: FieldType,
    },
}

/// Errors from creating or spawning entities
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The entity lump text itself would not parse
    #[error("bad entity data: {0}")]
    BadEntityData(#[from] KeyValuesError),

    /// The one hard error in the core: an entity block without a classname
    /// cannot exist and aborts the level load.
    #[error("map entity block has no classname")]
    MissingClassname,

    /// No class registered under this name; the entity is skipped
    #[error("unknown entity classname {0:?}")]
    UnknownClass(String),

    /// A class-specific Spawn() rejected the entity
    #[error("{classname} failed to spawn: {reason}")]
    SpawnFailed { classname: String, reason: String },
}

/// Errors from the save/restore blob round trip
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Blob failed to encode or decode
    #[error("save data error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Saved data came from an incompatible version and was skipped
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
