//! String-keyed settings provider
//!
//! Keys are `:`-separated paths into a nested document, compared
//! case-insensitively per segment. Scalar leaves are rendered as strings;
//! sections (mappings and sequences) have no string value.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Separator between key path segments
pub const KEY_SEPARATOR: char = ':';

/// Anything that can answer string-keyed configuration lookups
pub trait ConfigSource: Send + Sync {
    /// Get the string value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Get the value under `key` or fall back to `default`
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Nested settings tree loaded from a configuration document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Map<String, Value>,
}

impl Settings {
    /// Create an empty settings tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from a parsed document. A null document is treated as empty.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            Value::Null => Ok(Self::new()),
            other => Err(ConfigError::InvalidRoot(kind_of(&other).to_string())),
        }
    }

    /// Builder-style variant of [`Settings::set`]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Store `value` under `key`, creating intermediate sections as needed.
    /// Existing segments are matched case-insensitively so an override
    /// replaces the document's value instead of shadowing it.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            let existing = find_key(current, segment).unwrap_or_else(|| segment.to_string());
            let entry = current
                .entry(existing)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }

        let existing = find_key(current, last).unwrap_or_else(|| last.to_string());
        current.insert(existing, Value::String(value.into()));
    }

    /// Look up the raw value (scalar or section) stored under `key`
    pub fn section(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split(KEY_SEPARATOR);
        let first = segments.next()?;
        let mut current = lookup(&self.root, first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => lookup(map, segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Whether no settings are present
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

impl ConfigSource for Settings {
    fn get(&self, key: &str) -> Option<String> {
        match self.section(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Flat key/value maps are handy for callers that already hold resolved settings
impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned().or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        })
    }
}

fn find_key(map: &Map<String, Value>, segment: &str) -> Option<String> {
    if map.contains_key(segment) {
        return Some(segment.to_string());
    }
    map.keys().find(|k| k.eq_ignore_ascii_case(segment)).cloned()
}

fn lookup<'a>(map: &'a Map<String, Value>, segment: &str) -> Option<&'a Value> {
    map.get(segment).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(segment))
            .map(|(_, v)| v)
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
