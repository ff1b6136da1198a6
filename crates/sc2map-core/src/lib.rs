//! Bit-packed versioned decoder for StarCraft II map-catalog binary formats.
//!
//! This crate reads the tagged, self-describing binary grammar shared by
//! the `s2mh`, `s2mi` wire formats into a generic [`Value`] tree. It knows
//! nothing about field names or schema versions; that interpretation layer
//! lives in `sc2map-schema`, which is built on top of this crate.
//!
//! ```
//! use sc2map_core::decode_unlabeled;
//!
//! // A one-byte VarInt node: tag 0x09, then the zig-zag varint for `5`.
//! let bytes = [0x09, 0x0a];
//! let value = decode_unlabeled(&bytes).unwrap();
//! assert_eq!(value.as_integer(), Some(5));
//! ```

pub mod bits;
pub mod decoder;
pub mod error;
pub mod value;
pub mod varint;

pub use bits::BitBuffer;
pub use decoder::{decode_unlabeled, skip_instance};
pub use error::DecodeError;
pub use value::Value;
