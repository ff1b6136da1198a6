//! Schema labeler, locale reader, and translation applicator for StarCraft
//! II map-catalog binary formats decoded by `sc2map-core`.
//!
//! Typical pipeline: `sc2map_core::decode_unlabeled` produces a `Value`
//! tree, [`label_s2mh`] or [`label_s2mi`] names its fields, [`parse_s2ml`]
//! reads a locale table, and [`apply_s2ml`] substitutes localized strings
//! into the labeled tree.

pub mod errors;
pub mod labeled;
pub mod locale;
mod schema;
pub mod translate;

pub use errors::{LocaleError, SchemaError, TranslateError};
pub use labeled::LabeledValue;
pub use locale::parse_s2ml;
pub use schema::{label_s2mh, label_s2mi};
pub use translate::{apply_s2ml, default_selector, Selector};
