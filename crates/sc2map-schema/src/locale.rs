//! XML locale (`s2ml`) reader (component F): a flat string table keyed by
//! decimal id.

use std::collections::BTreeMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::LocaleError;

fn entry_id(start: &BytesStart) -> Result<Option<String>, LocaleError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"id" {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

fn read_inner_text<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<String, LocaleError> {
    let mut text = String::new();
    loop {
        match reader.read_event_into(buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(t) => text.push_str(std::str::from_utf8(&t.into_inner())?),
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Parses a locale document into an id → text map. The root element must
/// be named `Locale`; a root with no children parses to an empty map.
pub fn parse_s2ml(xml: &[u8]) -> Result<BTreeMap<String, String>, LocaleError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut map = BTreeMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => return Err(LocaleError::MissingRoot),
            Event::Start(e) if e.name().as_ref() == b"Locale" => break,
            Event::Empty(e) if e.name().as_ref() == b"Locale" => return Ok(map),
            Event::Start(_) | Event::Empty(_) => return Err(LocaleError::MissingRoot),
            _ => {}
        }
        buf.clear();
    }
    buf.clear();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::End(e) if e.name().as_ref() == b"Locale" => break,
            Event::Start(e) => {
                let id = entry_id(&e)?;
                let text = read_inner_text(&mut reader, &mut buf)?;
                if let Some(id) = id {
                    map.insert(id, text);
                }
            }
            Event::Empty(e) => {
                if let Some(id) = entry_id(&e)? {
                    map.insert(id, String::new());
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_table() {
        let xml = br#"<Locale><Entry id="1">hello</Entry><Entry id="42">world</Entry></Locale>"#;
        let map = parse_s2ml(xml).unwrap();
        assert_eq!(map.get("1").map(String::as_str), Some("hello"));
        assert_eq!(map.get("42").map(String::as_str), Some("world"));
    }

    #[test]
    fn test_parse_empty_root_yields_empty_map() {
        let xml = b"<Locale></Locale>";
        assert!(parse_s2ml(xml).unwrap().is_empty());

        let xml = b"<Locale/>";
        assert!(parse_s2ml(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_missing_root_is_fatal() {
        let xml = b"<NotLocale></NotLocale>";
        assert!(matches!(parse_s2ml(xml), Err(LocaleError::MissingRoot)));

        assert!(matches!(parse_s2ml(b""), Err(LocaleError::MissingRoot)));
    }

    #[test]
    fn test_parse_handles_empty_entry_elements() {
        let xml = br#"<Locale><Entry id="7"/></Locale>"#;
        let map = parse_s2ml(xml).unwrap();
        assert_eq!(map.get("7").map(String::as_str), Some(""));
    }
}
