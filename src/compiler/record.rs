//! Source file records flowing through the content pipeline.

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// One file read from the source directory.
///
/// `source` is fixed at read time; `path` is the output path and changes as
/// stages rename the record. Both are relative and `/`-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub source: String,
    pub path: String,
    pub contents: Vec<u8>,
    pub attributes: Map<String, Value>,
}

/// All records of one build, keyed by output path.
pub type Records = BTreeMap<String, Record>;

impl Record {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            source: path.clone(),
            path,
            contents: contents.into(),
            attributes: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    /// Extension of the output path, without the dot.
    pub fn extension(&self) -> Option<&str> {
        extension(&self.path)
    }

    /// File name of the output path without its extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit_once('/').map_or(self.path.as_str(), |(_, name)| name)
    }

    /// Directory part of the output path (`""` at the root).
    pub fn dir(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }

    /// Truthiness in the loose sense front matter authors expect.
    pub fn flag(&self, key: &str) -> bool {
        match self.attr(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }

    /// Names of the collections this record belongs to.
    pub fn collections(&self) -> Vec<&str> {
        match self.attr("collection") {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Attributes plus `contents` and `path`, as seen by templates.
    pub fn to_value(&self) -> Value {
        let mut map = self.attributes.clone();
        map.insert("contents".into(), Value::String(self.text().into_owned()));
        map.entry("path").or_insert_with(|| Value::String(self.path.clone()));
        Value::Object(map)
    }
}

/// Extension of a `/`-separated path, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit_once('/').map_or(path, |(_, name)| name);
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .filter(|_| !name.starts_with('.') || name.matches('.').count() > 1)
}

/// Replace the extension of a `/`-separated path.
pub fn with_extension(path: &str, ext: &str) -> String {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    match dir {
        Some(dir) => format!("{dir}/{stem}.{ext}"),
        None => format!("{stem}.{ext}"),
    }
}
