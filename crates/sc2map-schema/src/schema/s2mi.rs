//! Labeler for the `s2mi` (map instance) format.

use sc2map_core::Value;

use super::common::*;
use crate::errors::SchemaError;
use crate::labeled::LabeledValue;

/// `{regionId, app (NUL-trimmed), realmId, battleTag}`, arity 4.
fn toon(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 4, path)?;

    let region_id = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    let app = bytes_to_string_lossy(trim_nul(expect_bytes(get(map, "1", path)?, &format!("{path}.1"))?));
    let realm_id = expect_integer(get(map, "2", path)?, &format!("{path}.2"))?;
    let battle_tag = expect_integer(get(map, "3", path)?, &format!("{path}.3"))?;

    Ok(LabeledValue::map([
        ("regionId", LabeledValue::Integer(region_id)),
        ("app", LabeledValue::String(app)),
        ("realmId", LabeledValue::Integer(realm_id)),
        ("battleTag", LabeledValue::Integer(battle_tag)),
    ]))
}

/// Renders a decoded node verbatim (field-tag-keyed) for the two fields
/// (`labels`, `clusterChildren`) the labeler surfaces without interpreting
/// their elements.
fn raw_value_to_labeled(value: &Value) -> LabeledValue {
    match value {
        Value::Null => LabeledValue::Null,
        Value::Integer(i) => LabeledValue::Integer(*i),
        Value::String(bytes) => LabeledValue::String(bytes_to_string_lossy(bytes)),
        Value::BitArray { bit_count, bytes } => LabeledValue::BitArray {
            bit_count: *bit_count,
            bytes: bytes.clone(),
        },
        Value::Sequence(items) => LabeledValue::Sequence(items.iter().map(raw_value_to_labeled).collect()),
        Value::Mapping(map) => {
            LabeledValue::Mapping(map.iter().map(|(k, v)| (k.clone(), raw_value_to_labeled(v))).collect())
        }
    }
}

/// Derives a boolean leniently as `int != 0`, unlike `s2mh`'s strict
/// `toBool` flags.
fn bool_field(map: &std::collections::BTreeMap<String, Value>, key: &str, path: &str) -> Result<bool, SchemaError> {
    let field_path = format!("{path}.{key}");
    Ok(expect_integer(get(map, key, path)?, &field_path)? != 0)
}

/// Labels an unlabeled `s2mi` tree. Root is a two-field struct whose `"0"`
/// subfield carries the content; allowed content versions: `{22, 23, 26}`.
pub fn label_s2mi(unlabeled: Value) -> Result<LabeledValue, SchemaError> {
    let root_map = expect_mapping(&unlabeled, "root")?;
    expect_arity(root_map, 2, "root")?;

    let map = expect_mapping(get(root_map, "0", "root")?, "root.0")?;
    let version = version_of(map);
    expect_version_in(version, &[22, 23, 26], "root.0")?;

    let path = "root.0";

    let header = instance_header(get(map, "0", path)?, &format!("{path}.0"))?;
    let header_cache_handle = depot_link(get(map, "1", path)?, &format!("{path}.1"))?;
    let upload_time = expect_integer(get(map, "2", path)?, &format!("{path}.2"))?;

    let is_linked = bool_field(map, "3", path)?;
    let is_locked = bool_field(map, "4", path)?;
    let is_private = bool_field(map, "5", path)?;
    let map_size = expect_integer(get(map, "6", path)?, &format!("{path}.6"))?;
    let name = bytes_to_string_lossy(expect_bytes(get(map, "7", path)?, &format!("{path}.7"))?);
    // field "8" (profile record address) is present on the wire but left
    // unlabeled.
    let is_mod = bool_field(map, "9", path)?;
    let author_toon_name = toon(get(map, "11", path)?, &format!("{path}.11"))?;
    let is_latest_version = bool_field(map, "12", path)?;
    let main_locale = expect_integer(get(map, "13", path)?, &format!("{path}.13"))?;
    let author_toon_handle = toon(get(map, "14", path)?, &format!("{path}.14"))?;
    let is_skip_initial_download = bool_field(map, "15", path)?;
    let created_time = expect_integer(get(map, "16", path)?, &format!("{path}.16"))?;
    let labels = raw_value_to_labeled(get(map, "17", path)?);
    let is_melee = bool_field(map, "18", path)?;
    let is_cluster = bool_field(map, "19", path)?;
    let cluster_parent = expect_integer(get(map, "20", path)?, &format!("{path}.20"))?;
    let cluster_children = raw_value_to_labeled(get(map, "21", path)?);
    let is_hidden_lobby = bool_field(map, "22", path)?;

    let is_extension_mod = match opt(map, "23") {
        None | Some(Value::Null) => false,
        Some(v) => {
            let field_path = format!("{path}.23");
            expect_integer(v, &field_path)? != 0
        }
    };

    let mut fields: Vec<(&str, LabeledValue)> = vec![
        ("header", header),
        ("headerCacheHandle", header_cache_handle),
        ("uploadTime", LabeledValue::Integer(upload_time)),
        ("isLinked", LabeledValue::Bool(is_linked)),
        ("isLocked", LabeledValue::Bool(is_locked)),
        ("isPrivate", LabeledValue::Bool(is_private)),
        ("mapSize", LabeledValue::Integer(map_size)),
        ("name", LabeledValue::String(name)),
        ("isMod", LabeledValue::Bool(is_mod)),
        ("authorToonName", author_toon_name),
        ("isLatestVersion", LabeledValue::Bool(is_latest_version)),
        ("mainLocale", LabeledValue::Integer(main_locale)),
        ("authorToonHandle", author_toon_handle),
        ("isSkipInitialDownload", LabeledValue::Bool(is_skip_initial_download)),
        ("createdTime", LabeledValue::Integer(created_time)),
        ("labels", labels),
        ("isMelee", LabeledValue::Bool(is_melee)),
        ("isCluster", LabeledValue::Bool(is_cluster)),
        ("clusterParent", LabeledValue::Integer(cluster_parent)),
        ("clusterChildren", cluster_children),
        ("isHiddenLobby", LabeledValue::Bool(is_hidden_lobby)),
        ("isExtensionMod", LabeledValue::Bool(is_extension_mod)),
    ];

    if version >= 24 {
        let transition_id = expect_integer(get(map, "24", path)?, &format!("{path}.24"))?;
        let last_publish_time = expect_integer(get(map, "25", path)?, &format!("{path}.25"))?;
        let first_public_publish_time = expect_integer(get(map, "26", path)?, &format!("{path}.26"))?;
        fields.push(("transitionId", LabeledValue::Integer(transition_id)));
        fields.push(("lastPublishTime", LabeledValue::Integer(last_publish_time)));
        fields.push(("firstPublicPublishTime", LabeledValue::Integer(first_public_publish_time)));
    }

    Ok(LabeledValue::object(fields))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn toon_value() -> Value {
        let mut m = BTreeMap::new();
        m.insert("0".to_string(), Value::Integer(1));
        m.insert("1".to_string(), Value::String(b"S2\0\0".to_vec()));
        m.insert("2".to_string(), Value::Integer(1));
        m.insert("3".to_string(), Value::Integer(123456));
        Value::Mapping(m)
    }

    fn instance_header_value(id: i64, version: i64) -> Value {
        let mut m = BTreeMap::new();
        m.insert("0".to_string(), Value::Integer(id));
        m.insert("1".to_string(), Value::Integer(version));
        Value::Mapping(m)
    }

    fn depot_link_value() -> Value {
        Value::String(vec![b'M', b'a', b'p', b'!', b'u', b's', 0, 0, 0xAB, 0xCD, 0xEF, 0x01, 0, 0, 0, 0])
    }

    fn base_content(version_field: i64) -> BTreeMap<String, Value> {
        let mut m = BTreeMap::new();
        m.insert("0".to_string(), instance_header_value(1, 1));
        m.insert("1".to_string(), depot_link_value());
        m.insert("2".to_string(), Value::Integer(1_700_000_000));
        m.insert("3".to_string(), Value::Integer(1));
        m.insert("4".to_string(), Value::Integer(0));
        m.insert("5".to_string(), Value::Integer(0));
        m.insert("6".to_string(), Value::Integer(4096));
        m.insert("7".to_string(), Value::String(b"My Map".to_vec()));
        m.insert("9".to_string(), Value::Integer(0));
        m.insert("11".to_string(), toon_value());
        m.insert("12".to_string(), Value::Integer(1));
        m.insert("13".to_string(), Value::Integer(0));
        m.insert("14".to_string(), toon_value());
        m.insert("15".to_string(), Value::Integer(0));
        m.insert("16".to_string(), Value::Integer(1_690_000_000));
        m.insert("17".to_string(), Value::Sequence(vec![]));
        m.insert("18".to_string(), Value::Integer(0));
        m.insert("19".to_string(), Value::Integer(0));
        m.insert("20".to_string(), Value::Integer(0));
        m.insert("21".to_string(), Value::Sequence(vec![]));
        m.insert(version_field.to_string(), Value::Integer(22));
        m
    }

    fn wrap_root(content: BTreeMap<String, Value>) -> Value {
        let mut root = BTreeMap::new();
        root.insert("0".to_string(), Value::Mapping(content));
        root.insert("1".to_string(), Value::Integer(0));
        Value::Mapping(root)
    }

    #[test]
    fn test_label_s2mi_happy_path() {
        let mut content = base_content(22);
        content.insert("22".to_string(), Value::Integer(1));

        let labeled = label_s2mi(wrap_root(content)).unwrap();
        let map = labeled.as_mapping().unwrap();
        assert_eq!(map["isLinked"], LabeledValue::Bool(true));
        assert_eq!(map["isHiddenLobby"], LabeledValue::Bool(true));
        assert_eq!(map["mapSize"], LabeledValue::Integer(4096));
        assert_eq!(map["name"], LabeledValue::String("My Map".to_string()));
        assert!(!map.contains_key("transitionId"));

        let toon_map = map["authorToonName"].as_mapping().unwrap();
        assert_eq!(toon_map["app"], LabeledValue::String("S2".to_string()));
    }

    #[test]
    fn test_label_s2mi_bool_flags_are_lenient_on_nonzero_values() {
        let mut content = base_content(22);
        content.insert("3".to_string(), Value::Integer(2));
        content.insert("22".to_string(), Value::Integer(0));
        let labeled = label_s2mi(wrap_root(content)).unwrap();
        let map = labeled.as_mapping().unwrap();
        assert_eq!(map["isLinked"], LabeledValue::Bool(true));
    }

    #[test]
    fn test_label_s2mi_defaults_is_extension_mod_false_when_absent() {
        let mut content = base_content(22);
        content.insert("22".to_string(), Value::Integer(0));
        let labeled = label_s2mi(wrap_root(content)).unwrap();
        let map = labeled.as_mapping().unwrap();
        assert_eq!(map["isExtensionMod"], LabeledValue::Bool(false));
    }

    #[test]
    fn test_label_s2mi_version_24_adds_publish_fields() {
        let mut content = base_content(22);
        content.insert("22".to_string(), Value::Integer(0));
        content.insert("23".to_string(), Value::Integer(1));
        content.insert("24".to_string(), Value::Integer(7));
        content.insert("25".to_string(), Value::Integer(1_600_000_000));
        content.insert("26".to_string(), Value::Integer(1_500_000_000));

        let labeled = label_s2mi(wrap_root(content)).unwrap();
        let map = labeled.as_mapping().unwrap();
        assert_eq!(map["isExtensionMod"], LabeledValue::Bool(true));
        assert_eq!(map["transitionId"], LabeledValue::Integer(7));
        assert_eq!(map["lastPublishTime"], LabeledValue::Integer(1_600_000_000));
        assert_eq!(map["firstPublicPublishTime"], LabeledValue::Integer(1_500_000_000));
    }

    #[test]
    fn test_label_s2mi_rejects_wrong_version() {
        let mut content = base_content(22);
        content.insert("22".to_string(), Value::Integer(0));
        content.remove("24");
        let mut bad = content.clone();
        bad.insert("99".to_string(), Value::Integer(0));
        let err = label_s2mi(wrap_root(bad)).unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedVersion { .. }));
    }
}
