//! Translation applicator (component G): substitutes `LocalizationTableKey`
//! nodes in a labeled `s2mh` tree with their resolved text from a locale
//! map, guided by a field-selector tree.

use std::collections::BTreeMap;

use crate::errors::TranslateError;
use crate::labeled::LabeledValue;

/// A selector node: either a leaf (translate this `LocalizationTableKey`)
/// or a subtree naming further fields to recurse into.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Leaf,
    Subtree(BTreeMap<String, Selector>),
}

fn subtree<const N: usize>(fields: [(&str, Selector); N]) -> Selector {
    Selector::Subtree(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// The built-in selector schema used when the caller passes no selector:
/// `workingSet.{name,description}`, `tileset`, `variants.{categoryName,
/// modeName, categoryDescription, modeDescription}`, and the `arcadeInfo`
/// screenshot/section/website fields.
pub fn default_selector() -> Selector {
    subtree([
        ("workingSet", subtree([("name", Selector::Leaf), ("description", Selector::Leaf)])),
        ("tileset", Selector::Leaf),
        (
            "variants",
            subtree([
                ("categoryName", Selector::Leaf),
                ("modeName", Selector::Leaf),
                ("categoryDescription", Selector::Leaf),
                ("modeDescription", Selector::Leaf),
            ]),
        ),
        (
            "arcadeInfo",
            subtree([
                ("gameInfoScreenshots", subtree([("caption", Selector::Leaf)])),
                ("howToPlayScreenshots", subtree([("caption", Selector::Leaf)])),
                (
                    "howToPlaySections",
                    subtree([("title", Selector::Leaf), ("subtitle", Selector::Leaf), ("items", Selector::Leaf)]),
                ),
                (
                    "patchNoteSections",
                    subtree([("title", Selector::Leaf), ("subtitle", Selector::Leaf), ("items", Selector::Leaf)]),
                ),
                ("website", Selector::Leaf),
            ]),
        ),
    ])
}

fn translate_localization_table_key(
    value: &mut LabeledValue,
    locale: &BTreeMap<String, String>,
    path: &str,
) -> Result<(), TranslateError> {
    let index = match value {
        LabeledValue::Null => return Ok(()),
        LabeledValue::Mapping(m) => match m.get("index") {
            Some(LabeledValue::Integer(i)) => *i,
            _ => {
                return Err(TranslateError::MissingField {
                    path: format!("{path}.index"),
                })
            }
        },
        _ => return Err(TranslateError::UnexpectedShape { path: path.to_string() }),
    };

    *value = if index == 0 {
        LabeledValue::Null
    } else {
        match locale.get(&index.to_string()) {
            Some(text) => LabeledValue::String(text.clone()),
            None => LabeledValue::Null,
        }
    };
    Ok(())
}

fn apply_subtree(
    map: &mut BTreeMap<String, LabeledValue>,
    selector: &BTreeMap<String, Selector>,
    locale: &BTreeMap<String, String>,
    path: &str,
) -> Result<(), TranslateError> {
    for (key, rule) in selector {
        let field_path = format!("{path}.{key}");
        let value = map.get_mut(key).ok_or_else(|| TranslateError::MissingField {
            path: field_path.clone(),
        })?;
        apply_rule(value, rule, locale, &field_path)?;
    }
    Ok(())
}

fn apply_rule(
    value: &mut LabeledValue,
    rule: &Selector,
    locale: &BTreeMap<String, String>,
    path: &str,
) -> Result<(), TranslateError> {
    match value {
        LabeledValue::Sequence(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                apply_rule(item, rule, locale, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        LabeledValue::Null => Ok(()),
        LabeledValue::Mapping(_) => match rule {
            Selector::Leaf => translate_localization_table_key(value, locale, path),
            Selector::Subtree(sub) => {
                let LabeledValue::Mapping(m) = value else {
                    unreachable!("matched Mapping above")
                };
                apply_subtree(m, sub, locale, path)
            }
        },
        _ => Err(TranslateError::UnexpectedShape { path: path.to_string() }),
    }
}

/// Applies a locale map onto a labeled `s2mh` tree, replacing every
/// selected `LocalizationTableKey` with its resolved text (or `Null`).
/// Returns the mutated tree.
pub fn apply_s2ml(
    mut labeled: LabeledValue,
    locale: &BTreeMap<String, String>,
    selector: Option<&Selector>,
) -> Result<LabeledValue, TranslateError> {
    let owned_default;
    let selector = match selector {
        Some(s) => s,
        None => {
            owned_default = default_selector();
            &owned_default
        }
    };

    let Selector::Subtree(top) = selector else {
        return Err(TranslateError::UnexpectedShape { path: "root".to_string() });
    };

    match &mut labeled {
        LabeledValue::Mapping(m) => apply_subtree(m, top, locale, "root")?,
        _ => return Err(TranslateError::UnexpectedShape { path: "root".to_string() }),
    }

    Ok(labeled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localization_table_key(index: i64) -> LabeledValue {
        LabeledValue::map([
            ("color", LabeledValue::Null),
            ("table", LabeledValue::Integer(0)),
            ("index", LabeledValue::Integer(index)),
        ])
    }

    #[test]
    fn test_apply_translates_working_set_name() {
        let labeled = LabeledValue::map([(
            "workingSet",
            LabeledValue::map([
                ("name", localization_table_key(42)),
                ("description", localization_table_key(0)),
            ]),
        )]);
        let mut locale = BTreeMap::new();
        locale.insert("42".to_string(), "hello".to_string());

        let result = apply_s2ml(labeled, &locale, None).unwrap();
        let ws = result.as_mapping().unwrap()["workingSet"].as_mapping().unwrap();
        assert_eq!(ws["name"], LabeledValue::String("hello".to_string()));
        assert_eq!(ws["description"], LabeledValue::Null);
    }

    #[test]
    fn test_apply_missing_locale_entry_yields_null() {
        let labeled = LabeledValue::map([("tileset", localization_table_key(7))]);
        let locale = BTreeMap::new();

        let result = apply_s2ml(labeled, &locale, None).unwrap();
        assert_eq!(result.as_mapping().unwrap()["tileset"], LabeledValue::Null);
    }

    #[test]
    fn test_apply_recurses_into_sequences() {
        let labeled = LabeledValue::map([(
            "variants",
            LabeledValue::Sequence(vec![LabeledValue::map([
                ("categoryName", localization_table_key(1)),
                ("modeName", localization_table_key(0)),
                ("categoryDescription", localization_table_key(0)),
                ("modeDescription", localization_table_key(0)),
            ])]),
        )]);
        let mut locale = BTreeMap::new();
        locale.insert("1".to_string(), "Category".to_string());

        let result = apply_s2ml(labeled, &locale, None).unwrap();
        let variants = result.as_mapping().unwrap()["variants"].as_sequence().unwrap();
        assert_eq!(variants[0].as_mapping().unwrap()["categoryName"], LabeledValue::String("Category".to_string()));
    }
}
