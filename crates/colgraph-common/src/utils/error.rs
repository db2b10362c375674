//! Error types for Colgraph.
//!
//! Expected, recoverable conditions (missing vertex, duplicate index name)
//! are ordinary variants of [`Error`]; nothing in the graph layer panics on
//! them. Nothing is retried internally either: callers own retry policy and
//! can consult [`Error::is_retryable`].

use std::time::Duration;

use thiserror::Error;

use crate::types::VertexId;

/// Result type alias for Colgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Failure reported by the underlying column store.
    #[error("store error: {0}")]
    Storage(#[from] StorageError),

    /// Value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Vertex, edge or index is absent.
    #[error("{0} not found")]
    NotFound(NotFoundKind),

    /// Edge creation or removal referenced a vertex row that does not exist.
    #[error("dangling endpoint: vertex {0} does not exist")]
    DanglingEndpoint(VertexId),

    /// An index with this name is already registered.
    #[error("index '{0}' already exists")]
    IndexAlreadyExists(String),

    /// Two schema objects map to the same physical name.
    #[error("schema conflict: {0}")]
    SchemaConflict(String),

    /// A row lock could not be acquired in time.
    #[error("timed out after {timeout:?} waiting for a row lock in table '{table}'")]
    LockTimeout {
        /// Table holding the contended row.
        table: String,
        /// How long the caller waited.
        timeout: Duration,
    },

    /// A fixed-width identifier had the wrong length.
    #[error("malformed {kind}: expected {expected} bytes, got {actual}")]
    MalformedId {
        /// Which identifier was being decoded.
        kind: &'static str,
        /// Schema width.
        expected: usize,
        /// Observed width.
        actual: usize,
    },

    /// A property key is empty or reserved.
    #[error("invalid property key '{0}'")]
    InvalidPropertyKey(String),
}

impl Error {
    /// Returns true if the same call may succeed when repeated.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout { .. } | Self::Storage(StorageError::Unavailable(_))
        )
    }

    /// Returns true for [`Error::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// What was not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundKind {
    /// A vertex row.
    Vertex,
    /// An edge entry in its out-vertex row.
    Edge,
    /// A registered index, by name.
    Index(String),
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Edge => f.write_str("edge"),
            Self::Index(name) => write!(f, "index '{name}'"),
        }
    }
}

/// Column store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The table does not exist.
    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    /// The table already exists.
    #[error("table '{0}' already exists")]
    TableExists(String),

    /// The column family is not declared on the table.
    #[error("column family '{family}' is not declared on table '{table}'")]
    UnknownFamily {
        /// Table name.
        table: String,
        /// Family name.
        family: String,
    },

    /// A lock token was used that the store does not hold.
    #[error("row lock {0} is not held")]
    LockNotHeld(u64),

    /// The store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Value codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value's type, or a persisted tag, is outside the supported set.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The payload length does not match what the tag requires.
    #[error("malformed {tag} payload: expected {expected} bytes, got {actual}")]
    MalformedPayload {
        /// Type the tag announced.
        tag: &'static str,
        /// Expected payload width.
        expected: usize,
        /// Observed payload width.
        actual: usize,
    },

    /// A string payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}
