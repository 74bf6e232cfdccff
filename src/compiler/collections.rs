//! Named, sorted groups of records (e.g. `posts`).
//!
//! A record joins a collection when its source path matches the collection's
//! pattern or when its front matter names the collection (`collection: posts`).
//! Members get a `collection` list attribute and `previous` / `next` source
//! paths of their neighbours; the templates stage resolves those to objects.

use super::pipeline::{BuildContext, Stage};
use super::record::{Record, Records};
use crate::config::CollectionConfig;
use crate::utils::{date::parse_date, glob::Globs};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

struct Collection {
    name: String,
    pattern: Globs,
    sort_by: String,
    reverse: bool,
}

impl Collection {
    fn contains(&self, record: &Record) -> bool {
        self.pattern.is_match(&record.source) || record.collections().contains(&self.name.as_str())
    }
}

pub struct Collections {
    collections: Vec<Collection>,
}

impl Collections {
    pub fn new(config: &BTreeMap<String, CollectionConfig>) -> Result<Self> {
        let collections = config
            .iter()
            .map(|(name, c)| {
                Ok(Collection {
                    name: name.clone(),
                    pattern: Globs::new(c.pattern.as_slice())?,
                    sort_by: c.sort_by.clone(),
                    reverse: c.reverse,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { collections })
    }
}

impl Stage for Collections {
    fn name(&self) -> &'static str {
        "collections"
    }

    fn transform(&self, mut records: Records, ctx: &mut BuildContext<'_>) -> Result<Records> {
        let by_source: FxHashMap<String, String> = records
            .values()
            .map(|r| (r.source.clone(), r.path.clone()))
            .collect();

        for collection in &self.collections {
            let mut members: Vec<(Option<SortKey>, &Record)> = records
                .values()
                .filter(|r| collection.contains(r))
                .map(|r| (r.attr(&collection.sort_by).map(SortKey::of), r))
                .collect();
            members.sort_by(|(ka, a), (kb, b)| {
                compare_keys(ka.as_ref(), kb.as_ref(), collection.reverse)
                    .then_with(|| a.source.cmp(&b.source))
            });
            let sources: Vec<String> = members.iter().map(|(_, r)| r.source.clone()).collect();

            for (i, source) in sources.iter().enumerate() {
                let Some(record) = by_source.get(source).and_then(|p| records.get_mut(p)) else {
                    continue;
                };
                add_membership(record, &collection.name);
                set_neighbour(record, "previous", i.checked_sub(1).and_then(|j| sources.get(j)));
                set_neighbour(record, "next", sources.get(i + 1));
            }

            ctx.collections.insert(collection.name.clone(), sources);
        }

        Ok(records)
    }
}

fn add_membership(record: &mut Record, name: &str) {
    let mut names: Vec<Value> = record
        .collections()
        .into_iter()
        .map(|n| Value::String(n.to_owned()))
        .collect();
    if !names.iter().any(|n| n == name) {
        names.push(Value::String(name.to_owned()));
    }
    record.attributes.insert("collection".into(), Value::Array(names));
}

fn set_neighbour(record: &mut Record, key: &str, source: Option<&String>) {
    match source {
        Some(source) => record.attributes.insert(key.into(), Value::String(source.clone())),
        None => record.attributes.remove(key),
    };
}

/// Sort key of one attribute value. Kinds rank dates, then numbers, then
/// text, so mixed values still form a total order.
#[derive(Debug, Clone)]
enum SortKey {
    Date(DateTime<Utc>),
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::String(s) => parse_date(s).map_or_else(|| Self::Text(s.clone()), Self::Date),
            Value::Number(n) => n.as_f64().map_or_else(|| Self::Text(n.to_string()), Self::Number),
            other => Self::Text(other.to_string()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Date(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Records lacking the key always sort last. `reverse` flips the order within
/// one kind of key; dates still come before numbers and text.
fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, reverse: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.rank().cmp(&y.rank()).then_with(|| {
            let ord = x.cmp(y);
            if reverse { ord.reverse() } else { ord }
        }),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Dates compare as instants, numbers numerically, everything else as text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    SortKey::of(a).cmp(&SortKey::of(b))
}
