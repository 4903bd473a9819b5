//! Loading and saving documents on a [`Storage`].

use std::io;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::options::{Options, ReplacePolicy};
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: file not found")]
    NotFound { path: String },

    #[error("{path}: read failed: {source}")]
    Read { path: String, source: io::Error },

    #[error("{path}: {bytes} bytes exceeds the {max} byte limit")]
    TooLarge { path: String, bytes: u64, max: u64 },

    #[error("{path}: parse failed: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("{path}: write failed: {source}")]
    Write { path: String, source: io::Error },
}

/// Reads and writes [`Document`]s by name.
#[derive(Debug)]
pub struct DocumentStore<S> {
    storage: S,
    max_bytes: u64,
    policy: ReplacePolicy,
}

impl<S: Storage> DocumentStore<S> {
    /// Creates a store over `storage` using the size limit and replace
    /// policy from `options`.
    pub fn new(storage: S, options: &Options) -> Self {
        Self {
            storage,
            max_bytes: options.max_document_bytes,
            policy: options.replace_policy,
        }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Loads and parses `path`. The file size is checked against the limit
    /// before anything is read, so oversized files are never buffered.
    pub fn load(&self, path: &str) -> Result<Document, StoreError> {
        if !self.storage.exists(path) {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        }

        let size = self.storage.size(path).map_err(|e| read_error(path, e))?;
        self.check_size(path, size)?;

        let bytes = self.storage.read(path).map_err(|e| read_error(path, e))?;
        // The file may have grown since it was measured.
        self.check_size(path, bytes.len() as u64)?;

        let doc = Document::from_json_reader(bytes.as_slice()).map_err(|e| StoreError::Parse {
            path: path.to_string(),
            source: e,
        })?;
        debug!(path, keys = doc.len(), "loaded document");
        Ok(doc)
    }

    fn check_size(&self, path: &str, bytes: u64) -> Result<(), StoreError> {
        if bytes > self.max_bytes {
            return Err(StoreError::TooLarge {
                path: path.to_string(),
                bytes,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Serializes `doc` and puts it in place of `path`.
    pub fn save(&self, path: &str, doc: &Document) -> Result<(), StoreError> {
        let json = doc.to_json_pretty().map_err(|e| StoreError::Write {
            path: path.to_string(),
            source: e.into(),
        })?;

        let result = match self.policy {
            ReplacePolicy::RemoveThenWrite => {
                if !self.storage.remove(path) {
                    debug!(path, "nothing to remove before write");
                }
                self.storage.create(path, json.as_bytes())
            }
            ReplacePolicy::TempThenRename => self.storage.replace_atomic(path, json.as_bytes()),
        };

        match result {
            Ok(()) => {
                info!(path, keys = doc.len(), "saved document");
                Ok(())
            }
            Err(e) => {
                warn!(path, error = %e, policy = ?self.policy, "save failed");
                Err(StoreError::Write {
                    path: path.to_string(),
                    source: e,
                })
            }
        }
    }
}

fn read_error(path: &str, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound {
            path: path.to_string(),
        }
    } else {
        StoreError::Read {
            path: path.to_string(),
            source: e,
        }
    }
}
