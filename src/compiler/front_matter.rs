//! YAML front matter extraction.
//!
//! ```text
//! ---
//! title: Hello
//! date: 2021-03-05
//! ---
//! Body starts here.
//! ```
//!
//! The block must open on the first line. Keys are merged into the record's
//! attributes and the body replaces the contents. A file without a block, with
//! an unterminated block, or with YAML that is not a mapping passes through
//! untouched.

use super::record::Record;
use crate::log;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

const FENCE: &str = "---";

/// Split `text` into `(yaml, body)` if it starts with a fenced block.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, mut rest) = next_line(text)?;
    if first.trim_end() != FENCE {
        return None;
    }

    let yaml_start = rest;
    let mut yaml_len = 0;
    loop {
        let (line, after) = next_line(rest)?;
        if line.trim_end() == FENCE {
            return Some((&yaml_start[..yaml_len], after));
        }
        yaml_len += rest.len() - after.len();
        rest = after;
    }
}

/// Return the first line (without its terminator) and the remainder.
fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    Some(match text.find('\n') {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => (text, ""),
    })
}

/// Parse a front-matter document into attributes and body.
///
/// `Ok(None)` means there is no block; `Err` carries the YAML problem for
/// a block that exists but cannot be used.
pub fn parse(text: &str) -> Result<Option<(Map<String, Value>, &str)>, String> {
    let Some((yaml, body)) = split(text) else {
        return Ok(None);
    };

    let attributes = match serde_yaml::from_str::<Yaml>(yaml).map_err(|e| e.to_string())? {
        Yaml::Null => Map::new(),
        Yaml::Mapping(mapping) => mapping
            .into_iter()
            .map(|(k, v)| (yaml_key(&k), yaml_to_json(v)))
            .collect(),
        other => return Err(format!("expected a mapping, found {}", yaml_kind(&other))),
    };

    Ok(Some((attributes, body)))
}

/// Merge front matter into `record`, replacing its contents with the body.
pub fn extract(mut record: Record) -> Record {
    let Ok(text) = std::str::from_utf8(&record.contents) else {
        return record;
    };

    match parse(text) {
        Ok(Some((attributes, body))) => {
            record.contents = body.as_bytes().to_vec();
            record.attributes.extend(attributes);
        }
        Ok(None) => {}
        Err(e) => log!("warn"; "{}: ignoring front matter: {e}", record.source),
    }

    record
}

fn yaml_key(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".into(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

fn yaml_to_json(value: Yaml) -> Value {
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(&k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

const fn yaml_kind(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a boolean",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a sequence",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}
