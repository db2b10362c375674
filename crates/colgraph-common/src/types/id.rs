//! Fixed-width identifiers and their composition rules.
//!
//! Every identifier here has a schema-constant width, so composite keys can
//! be concatenated and split without length prefixes:
//!
//! | Identifier | Width | Layout |
//! |------------|-------|--------|
//! | [`VertexId`] | 16 | time (8, BE) ‖ clock-seq/node (8, BE) |
//! | [`EdgeLocalId`] | 8 | time (8, BE) |
//! | [`EdgeId`] | 24 | VertexId ‖ EdgeLocalId |
//! | [`PropertyId`] | n + 8 | key bytes ‖ EdgeLocalId |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{Error, Result};

/// Width of a [`VertexId`] in bytes.
pub const VERTEX_ID_WIDTH: usize = 16;

/// Width of an [`EdgeLocalId`] in bytes.
pub const EDGE_LOCAL_ID_WIDTH: usize = 8;

/// Width of an [`EdgeId`] in bytes.
pub const EDGE_ID_WIDTH: usize = VERTEX_ID_WIDTH + EDGE_LOCAL_ID_WIDTH;

/// 100-ns intervals between the UUID epoch (1582-10-15) and the Unix epoch.
const UUID_EPOCH_OFFSET: u64 = 0x01B2_1DD2_1381_4000;

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

/// Globally unique vertex identifier, also the vertex's row key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId([u8; VERTEX_ID_WIDTH]);

impl VertexId {
    /// Builds an id from its time and clock-sequence/node components.
    #[must_use]
    pub fn from_parts(time: u64, clock_seq_and_node: u64) -> Self {
        let mut bytes = [0u8; VERTEX_ID_WIDTH];
        BigEndian::write_u64(&mut bytes[..8], time);
        BigEndian::write_u64(&mut bytes[8..], clock_seq_and_node);
        Self(bytes)
    }

    /// Parses an id from a row key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedId`] if `bytes` is not exactly
    /// [`VERTEX_ID_WIDTH`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = bytes.try_into().map_err(|_| Error::MalformedId {
            kind: "vertex id",
            expected: VERTEX_ID_WIDTH,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; VERTEX_ID_WIDTH] {
        &self.0
    }

    /// Returns the time component.
    #[must_use]
    pub fn time(&self) -> u64 {
        BigEndian::read_u64(&self.0[..8])
    }

    /// Returns the clock-sequence/node component.
    #[must_use]
    pub fn clock_seq_and_node(&self) -> u64 {
        BigEndian::read_u64(&self.0[8..])
    }
}

impl AsRef<[u8]> for VertexId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VertexId(")?;
        write_hex(f, &self.0)?;
        f.write_str(")")
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// Edge identifier unique within the scope of its out-vertex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeLocalId([u8; EDGE_LOCAL_ID_WIDTH]);

impl EdgeLocalId {
    /// Builds a local id from a time component.
    #[must_use]
    pub fn from_time(time: u64) -> Self {
        Self(time.to_be_bytes())
    }

    /// Parses a local id from a column name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedId`] if `bytes` is not exactly
    /// [`EDGE_LOCAL_ID_WIDTH`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = bytes.try_into().map_err(|_| Error::MalformedId {
            kind: "edge local id",
            expected: EDGE_LOCAL_ID_WIDTH,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; EDGE_LOCAL_ID_WIDTH] {
        &self.0
    }

    /// Returns the time component.
    #[must_use]
    pub fn time(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl AsRef<[u8]> for EdgeLocalId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EdgeLocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EdgeLocalId(")?;
        write_hex(f, &self.0)?;
        f.write_str(")")
    }
}

impl fmt::Display for EdgeLocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// Full edge identifier: the out-vertex of record followed by the local id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId([u8; EDGE_ID_WIDTH]);

impl EdgeId {
    /// Concatenates an out-vertex id and a local id.
    #[must_use]
    pub fn compose(vertex: VertexId, local: EdgeLocalId) -> Self {
        let mut bytes = [0u8; EDGE_ID_WIDTH];
        bytes[..VERTEX_ID_WIDTH].copy_from_slice(vertex.as_bytes());
        bytes[VERTEX_ID_WIDTH..].copy_from_slice(local.as_bytes());
        Self(bytes)
    }

    /// Splits the id back into its out-vertex id and local id.
    #[must_use]
    pub fn decompose(&self) -> (VertexId, EdgeLocalId) {
        (self.vertex_id(), self.local_id())
    }

    /// Parses an edge id from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedId`] if `bytes` is not exactly
    /// [`EDGE_ID_WIDTH`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = bytes.try_into().map_err(|_| Error::MalformedId {
            kind: "edge id",
            expected: EDGE_ID_WIDTH,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; EDGE_ID_WIDTH] {
        &self.0
    }

    /// Returns the out-vertex of record.
    #[must_use]
    pub fn vertex_id(&self) -> VertexId {
        let mut raw = [0u8; VERTEX_ID_WIDTH];
        raw.copy_from_slice(&self.0[..VERTEX_ID_WIDTH]);
        VertexId(raw)
    }

    /// Returns the local id within the out-vertex row.
    #[must_use]
    pub fn local_id(&self) -> EdgeLocalId {
        let mut raw = [0u8; EDGE_LOCAL_ID_WIDTH];
        raw.copy_from_slice(&self.0[VERTEX_ID_WIDTH..]);
        EdgeLocalId(raw)
    }
}

impl AsRef<[u8]> for EdgeId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EdgeId(")?;
        write_hex(f, &self.0)?;
        f.write_str(")")
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// Column name of an edge property inside the out-vertex's edge-properties
/// family: `key bytes ‖ EdgeLocalId`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(Vec<u8>);

impl PropertyId {
    /// Scopes `key` to one edge.
    #[must_use]
    pub fn compose(key: &str, local: EdgeLocalId) -> Self {
        let mut bytes = Vec::with_capacity(key.len() + EDGE_LOCAL_ID_WIDTH);
        bytes.extend_from_slice(key.as_bytes());
        bytes.extend_from_slice(local.as_bytes());
        Self(bytes)
    }

    /// Splits a raw column name into key bytes and local id.
    ///
    /// Returns `None` for column names shorter than the local-id width,
    /// which cannot be edge property columns.
    #[must_use]
    pub fn split(column: &[u8]) -> Option<(&[u8], EdgeLocalId)> {
        let boundary = column.len().checked_sub(EDGE_LOCAL_ID_WIDTH)?;
        let (key, local) = column.split_at(boundary);
        EdgeLocalId::from_bytes(local).ok().map(|local| (key, local))
    }

    /// Returns the raw column name.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the id, returning the raw column name.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for PropertyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::split(&self.0) {
            Some((key, local)) => write!(
                f,
                "PropertyId({}@{local})",
                String::from_utf8_lossy(key)
            ),
            None => f.write_str("PropertyId(<malformed>)"),
        }
    }
}

/// Time-ordered identifier source.
///
/// The time component is the count of 100-ns intervals since the UUID epoch,
/// forced strictly increasing across all ids drawn from one generator. The
/// clock-sequence/node component is fixed for the generator's lifetime.
#[derive(Debug)]
pub struct IdGenerator {
    last_time: AtomicU64,
    clock_seq_and_node: u64,
}

impl IdGenerator {
    /// Creates a generator with a random clock sequence and node.
    #[must_use]
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        // RFC 4122 variant bits on the clock sequence, multicast bit on the
        // node so a random node can never be mistaken for a hardware address.
        let clock_seq = (rng.r#gen::<u16>() & 0x3FFF) | 0x8000;
        let node = (rng.r#gen::<u64>() & 0x0000_FFFF_FFFF_FFFF) | 0x0000_0100_0000_0000;
        Self::with_clock_seq_and_node((u64::from(clock_seq) << 48) | node)
    }

    /// Creates a generator with a fixed clock-sequence/node component.
    #[must_use]
    pub fn with_clock_seq_and_node(clock_seq_and_node: u64) -> Self {
        Self {
            last_time: AtomicU64::new(0),
            clock_seq_and_node,
        }
    }

    /// Draws a fresh vertex id.
    pub fn new_vertex_id(&self) -> VertexId {
        VertexId::from_parts(self.next_time(), self.clock_seq_and_node)
    }

    /// Draws a fresh edge local id.
    pub fn new_edge_local_id(&self) -> EdgeLocalId {
        EdgeLocalId::from_time(self.next_time())
    }

    fn next_time(&self) -> u64 {
        let now = uuid_time_now();
        let previous = self
            .last_time
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn uuid_time_now() -> u64 {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (since_unix.as_nanos() / 100) as u64 + UUID_EPOCH_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_vertex_ids_are_unique_and_ordered() {
        let generator = IdGenerator::new();
        let ids: Vec<VertexId> = (0..1000).map(|_| generator.new_vertex_id()).collect();

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(ids.iter().all(|id| id.clock_seq_and_node() == ids[0].clock_seq_and_node()));
    }

    #[test]
    fn test_generator_shares_clock_between_id_kinds() {
        let generator = IdGenerator::with_clock_seq_and_node(42);
        let vertex = generator.new_vertex_id();
        let local = generator.new_edge_local_id();

        assert_eq!(vertex.clock_seq_and_node(), 42);
        assert!(local.time() > vertex.time());
    }

    #[test]
    fn test_edge_id_decompose() {
        let vertex = VertexId::from_parts(7, 9);
        let local = EdgeLocalId::from_time(11);
        let edge = EdgeId::compose(vertex, local);

        assert_eq!(edge.as_bytes().len(), EDGE_ID_WIDTH);
        assert_eq!(&edge.as_bytes()[..VERTEX_ID_WIDTH], vertex.as_bytes());
        assert_eq!(edge.decompose(), (vertex, local));
    }

    #[test]
    fn test_malformed_widths_are_errors() {
        assert!(matches!(
            EdgeId::from_bytes(&[0u8; 23]),
            Err(Error::MalformedId { expected: 24, actual: 23, .. })
        ));
        assert!(VertexId::from_bytes(&[0u8; 8]).is_err());
        assert!(EdgeLocalId::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_property_id_split() {
        let local = EdgeLocalId::from_time(0xDEAD_BEEF);
        let pid = PropertyId::compose("weight", local);

        let (key, split_local) = PropertyId::split(pid.as_bytes()).unwrap();
        assert_eq!(key, b"weight");
        assert_eq!(split_local, local);

        assert!(PropertyId::split(b"short").is_none());
    }

    #[test]
    fn test_display_is_hex() {
        let local = EdgeLocalId::from_time(0x0102);
        assert_eq!(local.to_string(), "0000000000000102");
    }

    proptest! {
        #[test]
        fn prop_edge_id_round_trip(time in any::<u64>(), node in any::<u64>(), local in any::<u64>()) {
            let vertex = VertexId::from_parts(time, node);
            let local = EdgeLocalId::from_time(local);
            let edge = EdgeId::compose(vertex, local);

            prop_assert_eq!(edge.decompose(), (vertex, local));
            prop_assert_eq!(EdgeId::from_bytes(edge.as_bytes()).unwrap(), edge);
        }
    }
}
