//! Read-only typed lookups over a parameter document loaded once at startup.

use tracing::{error, info};

use crate::document::Document;
use crate::storage::Storage;
use crate::store::{DocumentStore, StoreError};
use crate::value::Value;

/// Parameters loaded from a single document.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    doc: Document,
}

impl Parameters {
    /// Loads `path` once. Failures are logged and returned.
    pub fn load<S: Storage>(store: &DocumentStore<S>, path: &str) -> Result<Self, StoreError> {
        match store.load(path) {
            Ok(doc) => {
                info!(path, keys = doc.len(), "parameters loaded");
                Ok(Self { doc })
            }
            Err(e) => {
                error!(path, error = %e, "failed to load parameters");
                Err(e)
            }
        }
    }

    /// Returns the value of `key` whatever its type.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.doc.get(key)
    }

    /// Returns the value of `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the value of `key` if it is an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Returns the value of `key` if it is a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.doc.len()
    }
}
