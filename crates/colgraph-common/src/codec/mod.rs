//! Byte codecs for persisted values.
//!
//! - [`value`] - Tagged scalar encoding used for property cells and index row keys
//!
//! Identifier composition lives with the identifier types in
//! [`crate::types`], since every id is its own byte layout.

pub mod value;

pub use value::{ValueTag, decode_value, encode_value};
