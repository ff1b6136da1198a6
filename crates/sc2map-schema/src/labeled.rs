//! The labeled value tree produced by the schema labeler (component E) and
//! consumed by the translation applicator (component G).
//!
//! Unlike [`sc2map_core::Value`], keys here are human-meaningful field
//! names rather than decimal wire tags, and a `Bool` variant exists for
//! fields the labeler derives from a 0/1 integer.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A node of the labeled tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LabeledValue {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    BitArray { bit_count: usize, bytes: Vec<u8> },
    Sequence(Vec<LabeledValue>),
    Mapping(BTreeMap<String, LabeledValue>),
}

impl LabeledValue {
    /// Builds a `Mapping` from a fixed-size array of named fields.
    pub fn map<const N: usize>(fields: [(&str, LabeledValue); N]) -> LabeledValue {
        LabeledValue::Mapping(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Builds a `Mapping` from a variable-length list of named fields, for
    /// schema nodes whose field set depends on a version gate.
    pub fn object(fields: Vec<(&str, LabeledValue)>) -> LabeledValue {
        LabeledValue::Mapping(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Returns the inner mapping, if this node is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, LabeledValue>> {
        match self {
            LabeledValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns a mutable reference to the inner mapping, if this node is a
    /// `Mapping`.
    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, LabeledValue>> {
        match self {
            LabeledValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the inner sequence, if this node is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[LabeledValue]> {
        match self {
            LabeledValue::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a mutable reference to the inner sequence, if this node is a
    /// `Sequence`.
    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<LabeledValue>> {
        match self {
            LabeledValue::Sequence(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for LabeledValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            LabeledValue::Null => serializer.serialize_none(),
            LabeledValue::Bool(b) => serializer.serialize_bool(*b),
            LabeledValue::Integer(i) => serializer.serialize_i64(*i),
            LabeledValue::String(s) => serializer.serialize_str(s),
            LabeledValue::BitArray { bytes, .. } => {
                let mut seq = serializer.serialize_seq(Some(bytes.len()))?;
                for byte in bytes {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            LabeledValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            LabeledValue::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}
