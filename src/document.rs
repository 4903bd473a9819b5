//! Ordered key/value documents and their JSON form.

use std::io::Read;

use indexmap::IndexMap;
use json_comments::StripComments;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An ordered mapping from key to [`Value`].
///
/// Keys keep the order they had in the source file so the wizard walks them
/// the way the operator sees them on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    entries: IndexMap<String, Value>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object, allowing `//` and `/* */` comments.
    pub fn from_json_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(StripComments::new(reader))
    }

    /// Serializes as indented JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        Ok(serde_json::to_string_pretty(self)? + "\n")
    }

    /// Looks up `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the entry at `index` in document order.
    pub fn get_index(&self, index: usize) -> Option<(&str, &Value)> {
        self.entries
            .get_index(index)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts or replaces a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
