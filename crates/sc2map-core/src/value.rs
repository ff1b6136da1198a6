//! The generic value tree produced by the tagged stream decoder.
//!
//! This is the decoder's native output: numerically keyed, untyped beyond
//! the nine wire variants. The schema labeler (in `sc2map-schema`) walks it
//! to produce a human-keyed tree; nothing in this crate assigns field names.

use std::collections::BTreeMap;

/// A decoded node of the tagged stream format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An absent `Optional` payload.
    Null,
    /// A signed integer from `Uint8`, `Uint32`, `Uint64`, or `VarInt`.
    Integer(i64),
    /// The raw contents of a `Blob`.
    String(Vec<u8>),
    /// A `BitArray`'s bit count and its packed bytes (bit 0 of byte 0 first).
    BitArray { bit_count: usize, bytes: Vec<u8> },
    /// The elements of an `Array` or the chosen payload of a `Choice`.
    Sequence(Vec<Value>),
    /// The fields of a `Struct`, keyed by their decimal field index.
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the integer payload, if this node is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the blob payload, if this node is a `String`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the struct fields, if this node is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the array/choice elements, if this node is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a struct field by its numeric index.
    pub fn field(&self, index: u64) -> Option<&Value> {
        self.as_mapping()?.get(&index.to_string())
    }
}
