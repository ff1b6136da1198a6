//! Error types for the schema labeler, locale reader, and translation
//! applicator.

/// Errors raised while labeling a decoded `Value` tree into a
/// [`crate::labeled::LabeledValue`] tree.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("decode error: {0}")]
    Decode(#[from] sc2map_core::DecodeError),

    #[error("{path}: unexpected ver {version}")]
    UnexpectedVersion { path: String, version: i64 },

    #[error("{path}: unexpected struct len {len}")]
    UnexpectedLen { path: String, len: usize },

    #[error("{path}: expected empty array, got {len} elements")]
    ExpectedEmptyArray { path: String, len: usize },

    #[error("{path}: sentinel mismatch, expected {expected}, got {actual}")]
    SentinelMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("unexpected special tag: {0}")]
    UnexpectedSpecialTag(String),

    #[error("{path}: expected field to be present")]
    MissingField { path: String },

    #[error("{path}: unexpected shape, expected {expected}")]
    UnexpectedShape { path: String, expected: String },

    #[error("{path}: boolean source not in {{0,1}}: {value}")]
    InvalidBool { path: String, value: i64 },
}

/// Errors raised while parsing a locale (`s2ml`) XML document.
#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("missing Locale root element")]
    MissingRoot,

    #[error("malformed UTF-8 in locale text: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Errors raised while applying a locale map onto a labeled `s2mh` tree.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("{path}: expected a mapping or sequence at selector node")]
    UnexpectedShape { path: String },

    #[error("{path}: field not present")]
    MissingField { path: String },
}
