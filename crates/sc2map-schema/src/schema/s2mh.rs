//! Labeler for the `s2mh` (map header) format.
//!
//! Field index → name mappings below follow the wire struct's own field
//! tags as given by the reference decoder; where the source only specifies
//! a name's semantics without an explicit index, the index is inferred
//! from the field's position in the enumeration order (documented at each
//! such site and recorded in `DESIGN.md`).

use std::collections::BTreeMap;

use sc2map_core::Value;

use super::common::*;
use crate::errors::SchemaError;
use crate::labeled::LabeledValue;

const KNOWN_SPECIAL_TAGS: &[&str] = &[
    "BLIZ", "TRIL", "FEAT", "PRGN", "HotS", "LotV", "WoL", "WoLX", "HoSX", "LoVX", "HerX", "Desc",
    "Glue", "Blnc", "PREM",
];

fn localization_link(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    let locale = bytes_to_string_lossy(expect_bytes(get(map, "0", path)?, &format!("{path}.0"))?);

    let table_path = format!("{path}.1");
    let table = expect_sequence(get(map, "1", path)?, &table_path)?;
    let mut items = Vec::with_capacity(table.len());
    for (i, item) in table.iter().enumerate() {
        items.push(depot_link(item, &format!("{table_path}[{i}]"))?);
    }

    Ok(LabeledValue::map([
        ("locale", LabeledValue::String(locale)),
        ("stringTable", LabeledValue::Sequence(items)),
    ]))
}

fn localization_table_key(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    if matches!(value, Value::Null) {
        return Ok(LabeledValue::Null);
    }
    let map = expect_mapping(value, path)?;
    expect_arity(map, 3, path)?;

    let color_raw = get(map, "0", path)?;
    let color = if matches!(color_raw, Value::Null) {
        LabeledValue::Null
    } else {
        LabeledValue::Integer(expect_integer(color_raw, &format!("{path}.0"))?)
    };
    let table = expect_integer(get(map, "1", path)?, &format!("{path}.1"))?;
    let index = expect_integer(get(map, "2", path)?, &format!("{path}.2"))?;

    Ok(LabeledValue::map([
        ("color", color),
        ("table", LabeledValue::Integer(table)),
        ("index", LabeledValue::Integer(index)),
    ]))
}

fn picture(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    if matches!(value, Value::Null) {
        return Ok(LabeledValue::Null);
    }
    let map = expect_mapping(value, path)?;
    expect_arity(map, 5, path)?;

    let index = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    let top = expect_integer(get(map, "1", path)?, &format!("{path}.1"))?;
    let left = expect_integer(get(map, "2", path)?, &format!("{path}.2"))?;
    let height = expect_integer(get(map, "3", path)?, &format!("{path}.3"))?;
    let width = expect_integer(get(map, "4", path)?, &format!("{path}.4"))?;

    Ok(LabeledValue::map([
        ("index", LabeledValue::Integer(index)),
        ("top", LabeledValue::Integer(top)),
        ("left", LabeledValue::Integer(left)),
        ("height", LabeledValue::Integer(height)),
        ("width", LabeledValue::Integer(width)),
    ]))
}

fn screenshot_entry(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let picture_val = picture(get(map, "0", path)?, &format!("{path}.0"))?;
    let caption = localization_table_key(get(map, "1", path)?, &format!("{path}.1"))?;
    Ok(LabeledValue::map([("picture", picture_val), ("caption", caption)]))
}

fn attribute_link(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let namespace = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    let id = expect_integer(get(map, "1", path)?, &format!("{path}.1"))?;
    Ok(LabeledValue::map([
        ("namespace", LabeledValue::Integer(namespace)),
        ("id", LabeledValue::Integer(id)),
    ]))
}

fn attribute_visual(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 3, path)?;
    let text = localization_table_key(get(map, "0", path)?, &format!("{path}.0"))?;
    let tip = localization_table_key(get(map, "1", path)?, &format!("{path}.1"))?;
    let art = picture(get(map, "2", path)?, &format!("{path}.2"))?;
    Ok(LabeledValue::map([("text", text), ("tip", tip), ("art", art)]))
}

fn attribute_value_definition(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    let version = version_of(map);
    expect_version_in(version, &[1, 2], path)?;
    if version >= 2 {
        expect_empty_array(get(map, "2", path)?, &format!("{path}.2"))?;
    }
    let val = bytes_to_string_lossy(trim_nul(expect_bytes(get(map, "0", path)?, &format!("{path}.0"))?));
    let visual = attribute_visual(get(map, "1", path)?, &format!("{path}.1"))?;
    Ok(LabeledValue::map([("value", LabeledValue::String(val)), ("visual", visual)]))
}

fn attribute_default_value(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let index = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    Ok(LabeledValue::map([("index", LabeledValue::Integer(index))]))
}

fn attribute_default_value_or_values(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    match value {
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(attribute_default_value(item, &format!("{path}[{i}]"))?);
            }
            Ok(LabeledValue::Sequence(out))
        }
        Value::Mapping(_) => attribute_default_value(value, path),
        _ => Err(SchemaError::UnexpectedShape {
            path: path.to_string(),
            expected: "Sequence or Mapping".into(),
        }),
    }
}

fn attribute_definition(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;

    let instance = attribute_link(get(map, "0", path)?, &format!("{path}.0"))?;

    let values_raw = expect_sequence(get(map, "1", path)?, &format!("{path}.1"))?;
    let mut values = Vec::with_capacity(values_raw.len());
    for (i, item) in values_raw.iter().enumerate() {
        values.push(attribute_value_definition(item, &format!("{path}.1[{i}]"))?);
    }

    let visual = attribute_visual(get(map, "2", path)?, &format!("{path}.2"))?;
    let arbitration = expect_integer(get(map, "3", path)?, &format!("{path}.3"))?;
    let visibility = expect_integer(get(map, "4", path)?, &format!("{path}.4"))?;
    let access = expect_integer(get(map, "5", path)?, &format!("{path}.5"))?;
    let options = expect_integer(get(map, "6", path)?, &format!("{path}.6"))?;
    let default = attribute_default_value_or_values(get(map, "7", path)?, &format!("{path}.7"))?;
    let sort_order = expect_integer(get(map, "8", path)?, &format!("{path}.8"))?;

    Ok(LabeledValue::map([
        ("instance", instance),
        ("values", LabeledValue::Sequence(values)),
        ("visual", visual),
        ("arbitration", LabeledValue::Integer(arbitration)),
        ("visibility", LabeledValue::Integer(visibility)),
        ("access", LabeledValue::Integer(access)),
        ("options", LabeledValue::Integer(options)),
        ("default", default),
        ("sortOrder", LabeledValue::Integer(sort_order)),
    ]))
}

fn variant_attribute_defaults(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let attribute = attribute_link(get(map, "0", path)?, &format!("{path}.0"))?;
    let val = attribute_default_value_or_values(get(map, "1", path)?, &format!("{path}.1"))?;
    Ok(LabeledValue::map([("attribute", attribute), ("value", val)]))
}

fn variant_attribute_locked(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let attribute = attribute_link(get(map, "0", path)?, &format!("{path}.0"))?;

    let bitarray_path = format!("{path}.1");
    let locked = match get(map, "1", path)? {
        Value::BitArray { bytes, .. } if bytes.len() >= 2 => {
            i64::from(u16::from_be_bytes([bytes[0], bytes[1]]))
        }
        _ => {
            return Err(SchemaError::UnexpectedShape {
                path: bitarray_path,
                expected: "BitArray with at least 2 bytes".into(),
            });
        }
    };

    Ok(LabeledValue::map([
        ("attribute", attribute),
        ("lockedScopes", LabeledValue::Integer(locked)),
    ]))
}

fn variant_attribute_visibility(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let attribute = attribute_link(get(map, "0", path)?, &format!("{path}.0"))?;
    let hidden = expect_integer(get(map, "1", path)?, &format!("{path}.1"))?;
    Ok(LabeledValue::map([("attribute", attribute), ("hidden", LabeledValue::Integer(hidden))]))
}

fn premium_info(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    if matches!(value, Value::Null) {
        return Ok(LabeledValue::Null);
    }
    let map = expect_mapping(value, path)?;
    let version = version_of(map);
    expect_version_in(version, &[0], path)?;
    let license = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    Ok(LabeledValue::map([("license", LabeledValue::Integer(license))]))
}

fn variant_info(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    let version = version_of(map);
    expect_version_in(version, &[8, 11, 12, 13, 14, 15], path)?;

    let ids_path = format!("{path}.0");
    let ids_map = expect_mapping(get(map, "0", path)?, &ids_path)?;
    expect_arity(ids_map, 2, &ids_path)?;
    let category_id = expect_integer(get(ids_map, "0", &ids_path)?, &format!("{ids_path}.0"))?;
    let mode_id = expect_integer(get(ids_map, "1", &ids_path)?, &format!("{ids_path}.1"))?;

    let category_name = localization_table_key(get(map, "1", path)?, &format!("{path}.1"))?;
    let mode_name = localization_table_key(get(map, "2", path)?, &format!("{path}.2"))?;
    let category_description = localization_table_key(get(map, "3", path)?, &format!("{path}.3"))?;
    let mode_description = localization_table_key(get(map, "4", path)?, &format!("{path}.4"))?;

    let sentinel_path = format!("{path}.5");
    let sentinel_map = expect_mapping(get(map, "5", path)?, &sentinel_path)?;
    expect_arity(sentinel_map, 3, &sentinel_path)?;

    let attribute_defaults_raw = expect_sequence(get(map, "6", path)?, &format!("{path}.6"))?;
    let mut attribute_defaults = Vec::with_capacity(attribute_defaults_raw.len());
    for (i, item) in attribute_defaults_raw.iter().enumerate() {
        attribute_defaults.push(variant_attribute_defaults(item, &format!("{path}.6[{i}]"))?);
    }

    let locked_attributes_raw = expect_sequence(get(map, "7", path)?, &format!("{path}.7"))?;
    let mut locked_attributes = Vec::with_capacity(locked_attributes_raw.len());
    for (i, item) in locked_attributes_raw.iter().enumerate() {
        locked_attributes.push(variant_attribute_locked(item, &format!("{path}.7[{i}]"))?);
    }

    let max_team_size = expect_integer(get(map, "8", path)?, &format!("{path}.8"))?;

    let mut fields: Vec<(&str, LabeledValue)> = vec![
        ("categoryId", LabeledValue::Integer(category_id)),
        ("modeId", LabeledValue::Integer(mode_id)),
        ("categoryName", category_name),
        ("modeName", mode_name),
        ("categoryDescription", category_description),
        ("modeDescription", mode_description),
        ("attributeDefaults", LabeledValue::Sequence(attribute_defaults)),
        ("lockedAttributes", LabeledValue::Sequence(locked_attributes)),
        ("maxTeamSize", LabeledValue::Integer(max_team_size)),
    ];

    if version >= 11 {
        let visibility_raw = expect_sequence(get(map, "9", path)?, &format!("{path}.9"))?;
        let mut attribute_visibility = Vec::with_capacity(visibility_raw.len());
        for (i, item) in visibility_raw.iter().enumerate() {
            attribute_visibility.push(variant_attribute_visibility(item, &format!("{path}.9[{i}]"))?);
        }
        fields.push(("attributeVisibility", LabeledValue::Sequence(attribute_visibility)));

        // field "10" exists on the wire in this version range but its
        // meaning is undocumented upstream; left unlabeled.

        let tags_raw = expect_sequence(get(map, "11", path)?, &format!("{path}.11"))?;
        let mut achievement_tags = Vec::with_capacity(tags_raw.len());
        for (i, item) in tags_raw.iter().enumerate() {
            let bytes = expect_bytes(item, &format!("{path}.11[{i}]"))?;
            achievement_tags.push(LabeledValue::String(bytes_to_string_lossy(trim_nul(bytes))));
        }
        fields.push(("achievementTags", LabeledValue::Sequence(achievement_tags)));
    }

    if version >= 12 {
        let max_human_players = match opt(map, "12") {
            Some(v) if !matches!(v, Value::Null) => {
                LabeledValue::Integer(expect_integer(v, &format!("{path}.12"))?)
            }
            _ => LabeledValue::Null,
        };
        fields.push(("maxHumanPlayers", max_human_players));
    }

    if version >= 13 {
        let max_open_slots = expect_integer(get(map, "13", path)?, &format!("{path}.13"))?;
        fields.push(("maxOpenSlots", LabeledValue::Integer(max_open_slots)));
    }

    if version >= 14 {
        let info = premium_info(get(map, "14", path)?, &format!("{path}.14"))?;
        fields.push(("premiumInfo", info));
    }

    if version >= 15 {
        let team_names_raw = expect_sequence(get(map, "15", path)?, &format!("{path}.15"))?;
        let mut team_names = Vec::with_capacity(team_names_raw.len());
        for (i, item) in team_names_raw.iter().enumerate() {
            team_names.push(localization_table_key(item, &format!("{path}.15[{i}]"))?);
        }
        fields.push(("teamNames", LabeledValue::Sequence(team_names)));
    }

    Ok(LabeledValue::object(fields))
}

fn working_set(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    let version = version_of(map);
    expect_version_in(version, &[8, 10, 11], path)?;

    let sentinel_path = format!("{path}.5");
    let sentinel = expect_integer(get(map, "5", path)?, &sentinel_path)?;
    if sentinel != 22 {
        return Err(SchemaError::SentinelMismatch {
            path: sentinel_path,
            expected: "22".into(),
            actual: sentinel.to_string(),
        });
    }

    if version >= 10 {
        expect_empty_array(get(map, "9", path)?, &format!("{path}.9"))?;
        expect_empty_array(get(map, "10", path)?, &format!("{path}.10"))?;
    }
    // field "11" (>=11) is present but intentionally not labeled.

    let name = localization_table_key(get(map, "0", path)?, &format!("{path}.0"))?;
    let description = localization_table_key(get(map, "1", path)?, &format!("{path}.1"))?;
    let thumbnail = picture(get(map, "2", path)?, &format!("{path}.2"))?;
    let big_map = picture(get(map, "3", path)?, &format!("{path}.3"))?;
    let max_players = expect_integer(get(map, "4", path)?, &format!("{path}.4"))?;

    let instances_raw = expect_sequence(get(map, "6", path)?, &format!("{path}.6"))?;
    let mut instances = Vec::with_capacity(instances_raw.len());
    for (i, item) in instances_raw.iter().enumerate() {
        instances.push(variant_attribute_defaults(item, &format!("{path}.6[{i}]"))?);
    }

    let visual_files_raw = expect_sequence(get(map, "7", path)?, &format!("{path}.7"))?;
    let mut visual_files = Vec::with_capacity(visual_files_raw.len());
    for (i, item) in visual_files_raw.iter().enumerate() {
        visual_files.push(depot_link(item, &format!("{path}.7[{i}]"))?);
    }

    let locale_table_raw = expect_sequence(get(map, "8", path)?, &format!("{path}.8"))?;
    let mut locale_table = Vec::with_capacity(locale_table_raw.len());
    for (i, item) in locale_table_raw.iter().enumerate() {
        locale_table.push(localization_link(item, &format!("{path}.8[{i}]"))?);
    }

    Ok(LabeledValue::map([
        ("name", name),
        ("description", description),
        ("thumbnail", thumbnail),
        ("bigMap", big_map),
        ("maxPlayers", LabeledValue::Integer(max_players)),
        ("instances", LabeledValue::Sequence(instances)),
        ("visualFiles", LabeledValue::Sequence(visual_files)),
        ("localeTable", LabeledValue::Sequence(locale_table)),
    ]))
}

/// Reshapes a flat (headers, items) pair into headers that each own a
/// contiguous slice of `items`, walking headers in reverse so each one's
/// `startOffset` bounds the previous header's slice.
fn arcade_section(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;

    let headers_path = format!("{path}.0");
    let headers_raw = expect_sequence(get(map, "0", path)?, &headers_path)?;
    let items_path = format!("{path}.1");
    let items_raw = expect_sequence(get(map, "1", path)?, &items_path)?;

    struct Header {
        title: LabeledValue,
        subtitle: LabeledValue,
        list_type: i64,
        start_offset: usize,
    }

    let mut headers = Vec::with_capacity(headers_raw.len());
    for (i, h) in headers_raw.iter().enumerate() {
        let hpath = format!("{headers_path}[{i}]");
        let hmap = expect_mapping(h, &hpath)?;
        expect_arity(hmap, 4, &hpath)?;
        let title = localization_table_key(get(hmap, "0", &hpath)?, &format!("{hpath}.0"))?;
        let start_offset_raw = expect_integer(get(hmap, "1", &hpath)?, &format!("{hpath}.1"))?;
        let list_type = expect_integer(get(hmap, "2", &hpath)?, &format!("{hpath}.2"))?;
        let subtitle = localization_table_key(get(hmap, "3", &hpath)?, &format!("{hpath}.3"))?;
        let start_offset = usize::try_from(start_offset_raw).map_err(|_| SchemaError::UnexpectedShape {
            path: format!("{hpath}.1"),
            expected: "non-negative offset".into(),
        })?;
        headers.push(Header {
            title,
            subtitle,
            list_type,
            start_offset,
        });
    }

    let mut translated_items = Vec::with_capacity(items_raw.len());
    for (i, item) in items_raw.iter().enumerate() {
        translated_items.push(localization_table_key(item, &format!("{items_path}[{i}]"))?);
    }

    let mut out: Vec<LabeledValue> = (0..headers.len()).map(|_| LabeledValue::Null).collect();
    let mut prev_offset = translated_items.len();
    for (i, header) in headers.iter().enumerate().rev() {
        let start = header.start_offset.min(prev_offset);
        let slice = translated_items
            .get(start..prev_offset)
            .ok_or_else(|| SchemaError::UnexpectedShape {
                path: format!("{headers_path}[{i}].2"),
                expected: "startOffset within item list bounds".into(),
            })?
            .to_vec();

        out[i] = LabeledValue::map([
            ("title", header.title.clone()),
            ("subtitle", header.subtitle.clone()),
            ("listType", LabeledValue::Integer(header.list_type)),
            ("items", LabeledValue::Sequence(slice)),
        ]);
        prev_offset = header.start_offset;
    }

    Ok(LabeledValue::Sequence(out))
}

fn arcade_tutorial_link(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    let version = version_of(map);
    expect_version_in(version, &[2], path)?;

    let variant_index = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    let speed = bytes_to_string_lossy(expect_bytes(get(map, "1", path)?, &format!("{path}.1"))?);

    let arr_path = format!("{path}.2");
    let arr = expect_sequence(get(map, "2", path)?, &arr_path)?;
    if arr.len() != 1 {
        return Err(SchemaError::UnexpectedLen {
            path: arr_path,
            len: arr.len(),
        });
    }
    let inner_path = format!("{arr_path}[0]");
    let inner_map = expect_mapping(&arr[0], &inner_path)?;
    expect_arity(inner_map, 2, &inner_path)?;
    let inner_1 = expect_integer(get(inner_map, "1", &inner_path)?, &format!("{inner_path}.1"))?;
    if inner_1 != 0 {
        return Err(SchemaError::SentinelMismatch {
            path: format!("{inner_path}.1"),
            expected: "0".into(),
            actual: inner_1.to_string(),
        });
    }
    let map_header = instance_header(get(inner_map, "0", &inner_path)?, &format!("{inner_path}.0"))?;

    Ok(LabeledValue::map([
        ("variantIndex", LabeledValue::Integer(variant_index)),
        ("speed", LabeledValue::String(speed)),
        ("map", map_header),
    ]))
}

fn arcade_info(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    let version = version_of(map);
    expect_version_in(version, &[9], path)?;

    expect_empty_array(get(map, "0", path)?, &format!("{path}.0"))?;
    expect_empty_array(get(map, "1", path)?, &format!("{path}.1"))?;

    let game_info_raw = expect_sequence(get(map, "2", path)?, &format!("{path}.2"))?;
    let mut game_info_screenshots = Vec::with_capacity(game_info_raw.len());
    for (i, item) in game_info_raw.iter().enumerate() {
        game_info_screenshots.push(screenshot_entry(item, &format!("{path}.2[{i}]"))?);
    }

    let how_to_play_screens_raw = expect_sequence(get(map, "3", path)?, &format!("{path}.3"))?;
    let mut how_to_play_screenshots = Vec::with_capacity(how_to_play_screens_raw.len());
    for (i, item) in how_to_play_screens_raw.iter().enumerate() {
        how_to_play_screenshots.push(screenshot_entry(item, &format!("{path}.3[{i}]"))?);
    }

    let how_to_play_sections = arcade_section(get(map, "4", path)?, &format!("{path}.4"))?;
    let patch_note_sections = arcade_section(get(map, "5", path)?, &format!("{path}.5"))?;
    let map_icon = picture(get(map, "6", path)?, &format!("{path}.6"))?;
    let tutorial_link = arcade_tutorial_link(get(map, "7", path)?, &format!("{path}.7"))?;

    let tags_raw = expect_sequence(get(map, "8", path)?, &format!("{path}.8"))?;
    let mut matchmaker_tags = Vec::with_capacity(tags_raw.len());
    for (i, item) in tags_raw.iter().enumerate() {
        let bytes = expect_bytes(item, &format!("{path}.8[{i}]"))?;
        matchmaker_tags.push(LabeledValue::String(bytes_to_string_lossy(trim_nul(bytes))));
    }

    let website = localization_table_key(get(map, "9", path)?, &format!("{path}.9"))?;

    Ok(LabeledValue::map([
        ("gameInfoScreenshots", LabeledValue::Sequence(game_info_screenshots)),
        ("howToPlayScreenshots", LabeledValue::Sequence(how_to_play_screenshots)),
        ("howToPlaySections", how_to_play_sections),
        ("patchNoteSections", patch_note_sections),
        ("mapIcon", map_icon),
        ("tutorialLink", tutorial_link),
        ("matchmakerTags", LabeledValue::Sequence(matchmaker_tags)),
        ("website", website),
    ]))
}

fn derive_special_tags_v11(map: &BTreeMap<String, Value>, path: &str) -> Result<Vec<LabeledValue>, SchemaError> {
    match opt(map, "11") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(bytes)) => Ok(vec![LabeledValue::String(bytes_to_string_lossy(trim_nul(bytes)))]),
        Some(Value::Sequence(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let bytes = expect_bytes(item, &format!("{path}.11[{i}]"))?;
                out.push(LabeledValue::String(bytes_to_string_lossy(trim_nul(bytes))));
            }
            Ok(out)
        }
        Some(_) => Err(SchemaError::UnexpectedShape {
            path: format!("{path}.11"),
            expected: "absent, String, or Sequence of String".into(),
        }),
    }
}

fn derive_special_tags_array(
    map: &BTreeMap<String, Value>,
    key: &str,
    path: &str,
) -> Result<Vec<LabeledValue>, SchemaError> {
    let raw = expect_sequence(get(map, key, path)?, &format!("{path}.{key}"))?;
    let mut out = Vec::with_capacity(raw.len());
    for (i, item) in raw.iter().enumerate() {
        let bytes = expect_bytes(item, &format!("{path}.{key}[{i}]"))?;
        out.push(LabeledValue::String(bytes_to_string_lossy(trim_nul(bytes))));
    }
    Ok(out)
}

fn validate_special_tags(tags: &[LabeledValue]) -> Result<(), SchemaError> {
    for tag in tags {
        if let LabeledValue::String(s) = tag {
            if !KNOWN_SPECIAL_TAGS.contains(&s.as_str()) {
                return Err(SchemaError::UnexpectedSpecialTag(s.clone()));
            }
        }
    }
    Ok(())
}

/// Labels an unlabeled `s2mh` tree. Allowed root versions: `{13, 14, 18,
/// 22, 23, 24}`.
pub fn label_s2mh(unlabeled: Value) -> Result<LabeledValue, SchemaError> {
    let root_map = expect_mapping(&unlabeled, "root")?;
    expect_arity(root_map, 2, "root")?;

    let content_map = expect_mapping(get(root_map, "0", "root")?, "root.0")?;
    let version = version_of(content_map);
    expect_version_in(version, &[13, 14, 18, 22, 23, 24], "root.0")?;

    let path = "root.0";

    let header = instance_header(get(content_map, "0", path)?, &format!("{path}.0"))?;
    let filename = bytes_to_string_lossy(expect_bytes(get(content_map, "1", path)?, &format!("{path}.1"))?);
    let archive_handle = depot_link(get(content_map, "2", path)?, &format!("{path}.2"))?;
    let map_namespace = expect_integer(get(content_map, "3", path)?, &format!("{path}.3"))?;
    let working_set_val = working_set(get(content_map, "4", path)?, &format!("{path}.4"))?;

    let attrs_raw = expect_sequence(get(content_map, "5", path)?, &format!("{path}.5"))?;
    let mut attributes = Vec::with_capacity(attrs_raw.len());
    for (i, item) in attrs_raw.iter().enumerate() {
        attributes.push(attribute_definition(item, &format!("{path}.5[{i}]"))?);
    }

    let locale_raw = expect_sequence(get(content_map, "8", path)?, &format!("{path}.8"))?;
    let mut locale_table = Vec::with_capacity(locale_raw.len());
    for (i, item) in locale_raw.iter().enumerate() {
        locale_table.push(localization_link(item, &format!("{path}.8[{i}]"))?);
    }

    let map_size = match opt(content_map, "9") {
        Some(v) if !matches!(v, Value::Null) => {
            let ms_path = format!("{path}.9");
            let ms_map = expect_mapping(v, &ms_path)?;
            expect_arity(ms_map, 2, &ms_path)?;
            let horizontal = expect_integer(get(ms_map, "0", &ms_path)?, &format!("{ms_path}.0"))?;
            let vertical = expect_integer(get(ms_map, "1", &ms_path)?, &format!("{ms_path}.1"))?;
            LabeledValue::map([
                ("horizontal", LabeledValue::Integer(horizontal)),
                ("vertical", LabeledValue::Integer(vertical)),
            ])
        }
        _ => LabeledValue::Null,
    };

    let tileset = localization_table_key(get(content_map, "10", path)?, &format!("{path}.10"))?;
    let default_variant_index = expect_integer(get(content_map, "12", path)?, &format!("{path}.12"))?;

    let variants_raw = expect_sequence(get(content_map, "13", path)?, &format!("{path}.13"))?;
    let mut variants = Vec::with_capacity(variants_raw.len());
    for (i, item) in variants_raw.iter().enumerate() {
        variants.push(variant_info(item, &format!("{path}.13[{i}]"))?);
    }

    let mut special_tags = derive_special_tags_v11(content_map, path)?;

    let mut fields: Vec<(&str, LabeledValue)> = vec![
        ("header", header),
        ("filename", LabeledValue::String(filename)),
        ("archiveHandle", archive_handle),
        ("mapNamespace", LabeledValue::Integer(map_namespace)),
        ("workingSet", working_set_val),
        ("attributes", LabeledValue::Sequence(attributes)),
        ("localeTable", LabeledValue::Sequence(locale_table)),
        ("mapSize", map_size),
        ("tileset", tileset),
        ("defaultVariantIndex", LabeledValue::Integer(default_variant_index)),
        ("variants", LabeledValue::Sequence(variants)),
    ];

    if version >= 14 {
        let deps_raw = expect_sequence(get(content_map, "14", path)?, &format!("{path}.14"))?;
        let mut extra_deps = Vec::with_capacity(deps_raw.len());
        for (i, item) in deps_raw.iter().enumerate() {
            extra_deps.push(instance_header(item, &format!("{path}.14[{i}]"))?);
        }
        fields.push(("extraDependencies", LabeledValue::Sequence(extra_deps)));
    }

    if version >= 18 {
        let add_default_permissions_raw =
            expect_integer(get(content_map, "15", path)?, &format!("{path}.15"))?;
        let add_default_permissions = bool_from_int(add_default_permissions_raw, &format!("{path}.15"))?;
        fields.push(("addDefaultPermissions", LabeledValue::Bool(add_default_permissions)));

        let perms_raw = expect_sequence(get(content_map, "16", path)?, &format!("{path}.16"))?;
        let mut relevant_permissions = Vec::with_capacity(perms_raw.len());
        for (i, item) in perms_raw.iter().enumerate() {
            let ppath = format!("{path}.16[{i}]");
            let pmap = expect_mapping(item, &ppath)?;
            let name =
                bytes_to_string_lossy(trim_nul(expect_bytes(get(pmap, "0", &ppath)?, &format!("{ppath}.0"))?));
            let id = expect_integer(get(pmap, "1", &ppath)?, &format!("{ppath}.1"))?;
            relevant_permissions.push(LabeledValue::map([
                ("name", LabeledValue::String(name)),
                ("id", LabeledValue::Integer(id)),
            ]));
        }
        fields.push(("relevantPermissions", LabeledValue::Sequence(relevant_permissions)));

        special_tags = derive_special_tags_array(content_map, "18", path)?;
    }

    if version >= 22 {
        let arcade_info_val = match opt(content_map, "19") {
            Some(v) if !matches!(v, Value::Null) => arcade_info(v, &format!("{path}.19"))?,
            _ => LabeledValue::Null,
        };
        fields.push(("arcadeInfo", arcade_info_val));

        let add_multi_mod_raw = expect_integer(get(content_map, "22", path)?, &format!("{path}.22"))?;
        fields.push((
            "addMultiMod",
            LabeledValue::Bool(bool_from_int(add_multi_mod_raw, &format!("{path}.22"))?),
        ));
    }

    // Fields "23"/"24" (version >= 23/24) exist on the wire but are
    // intentionally not surfaced in the labeled tree.

    validate_special_tags(&special_tags)?;
    fields.push(("specialTags", LabeledValue::Sequence(special_tags)));

    Ok(LabeledValue::object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_special_tags_rejects_unknown() {
        let tags = vec![LabeledValue::String("NOPE".into())];
        let err = validate_special_tags(&tags).unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedSpecialTag(s) if s == "NOPE"));
    }

    #[test]
    fn test_validate_special_tags_accepts_known() {
        let tags = vec![LabeledValue::String("LotV".into())];
        assert!(validate_special_tags(&tags).is_ok());
    }

    #[test]
    fn test_arcade_section_reshape_partitions_items() {
        let mut headers = Vec::new();
        for (start, list_type) in [(0i64, 0i64), (3, 1), (3, 2), (7, 0)] {
            let mut h = BTreeMap::new();
            h.insert("0".to_string(), Value::Null);
            h.insert("1".to_string(), Value::Integer(start));
            h.insert("2".to_string(), Value::Integer(list_type));
            h.insert("3".to_string(), Value::Null);
            headers.push(Value::Mapping(h));
        }
        let items: Vec<Value> = (0..9).map(Value::Integer).collect();

        let mut root = BTreeMap::new();
        root.insert("0".to_string(), Value::Sequence(headers));
        root.insert("1".to_string(), Value::Sequence(items));

        let labeled = arcade_section(&Value::Mapping(root), "section").unwrap();
        let seq = labeled.as_sequence().unwrap();
        assert_eq!(seq.len(), 4);

        let lens: Vec<usize> = seq
            .iter()
            .map(|h| h.as_mapping().unwrap().get("items").unwrap().as_sequence().unwrap().len())
            .collect();
        assert_eq!(lens, vec![3, 0, 4, 2]);
    }

    #[test]
    fn test_working_set_rejects_bad_sentinel() {
        let mut map = BTreeMap::new();
        map.insert("0".to_string(), Value::String(b"name".to_vec()));
        map.insert("1".to_string(), Value::String(b"desc".to_vec()));
        map.insert("2".to_string(), Value::String(vec![0u8; 16]));
        map.insert("3".to_string(), Value::String(vec![0u8; 16]));
        map.insert("4".to_string(), Value::Integer(6));
        map.insert("5".to_string(), Value::Integer(99));
        map.insert("6".to_string(), Value::Sequence(vec![]));
        map.insert("7".to_string(), Value::Sequence(vec![]));
        map.insert("8".to_string(), Value::Sequence(vec![]));

        let err = working_set(&Value::Mapping(map), "workingSet").unwrap_err();
        assert!(matches!(err, SchemaError::SentinelMismatch { .. }));
    }
}
