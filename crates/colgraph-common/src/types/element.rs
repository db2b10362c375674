//! Element kinds targeted by automatic indices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::error::{CodecError, Result};

/// The kind of graph element an index covers.
///
/// Resolved once when an index is created and carried explicitly through
/// every fan-out call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Vertices.
    Vertex,
    /// Edges.
    Edge,
}

impl ElementKind {
    /// Persisted class code for vertex indices.
    pub const VERTEX_CODE: i16 = 1;
    /// Persisted class code for edge indices.
    pub const EDGE_CODE: i16 = 2;

    /// Returns the persisted class code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Vertex => Self::VERTEX_CODE,
            Self::Edge => Self::EDGE_CODE,
        }
    }

    /// Decodes a persisted class code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedType`] for an unknown code.
    pub fn from_code(code: i16) -> Result<Self> {
        match code {
            Self::VERTEX_CODE => Ok(Self::Vertex),
            Self::EDGE_CODE => Ok(Self::Edge),
            other => Err(CodecError::UnsupportedType(format!("element class {other}")).into()),
        }
    }

    /// Encodes the class code as two big-endian bytes.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 2] {
        self.code().to_be_bytes()
    }

    /// Decodes the two-byte class code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedPayload`] if the slice is not two bytes
    /// long, or [`CodecError::UnsupportedType`] for an unknown code.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 2] = bytes.try_into().map_err(|_| CodecError::MalformedPayload {
            tag: "element class",
            expected: 2,
            actual: bytes.len(),
        })?;
        Self::from_code(i16::from_be_bytes(raw))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Edge => f.write_str("edge"),
        }
    }
}
