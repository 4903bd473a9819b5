//! Named-file storage underneath the document store.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Minimal file operations the document store needs.
///
/// Names are relative to whatever root the implementation manages.
pub trait Storage {
    /// Size of the file in bytes, without reading it.
    fn size(&self, name: &str) -> io::Result<u64>;

    /// Reads the whole file.
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Creates (or truncates) the file and writes `contents` to it.
    fn create(&self, name: &str, contents: &[u8]) -> io::Result<()>;

    /// Removes the file. Returns `false` if nothing was removed.
    fn remove(&self, name: &str) -> bool;

    /// True if `name` is an existing regular file.
    fn exists(&self, name: &str) -> bool;

    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    /// Replaces `name` so that readers see either the old or the new contents.
    ///
    /// The default stages the data in a sibling file and renames it over the
    /// target.
    fn replace_atomic(&self, name: &str, contents: &[u8]) -> io::Result<()> {
        let staging = format!("{name}.tmp");
        if let Err(e) = self.create(&staging, contents) {
            self.remove(&staging);
            return Err(e);
        }
        self.rename(&staging, name)
    }
}

/// Storage rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Creates storage over `root`. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a name against the root. A leading `/` means the root itself,
    /// unless the name is already a full path inside the root.
    ///
    /// Names containing `..` are refused so nothing outside the root is
    /// reachable.
    pub fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let as_path = Path::new(name);
        if as_path.components().any(|c| c == Component::ParentDir) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name}: parent directory components are not allowed"),
            ));
        }
        if as_path.is_absolute() && as_path.starts_with(&self.root) {
            return Ok(as_path.to_path_buf());
        }
        Ok(self.root.join(name.trim_start_matches('/')))
    }
}

impl Storage for DirStorage {
    fn size(&self, name: &str) -> io::Result<u64> {
        Ok(fs::metadata(self.resolve(name)?)?.len())
    }

    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(name)?)
    }

    fn create(&self, name: &str, contents: &[u8]) -> io::Result<()> {
        let path = self.resolve(name)?;
        let mut file = fs::File::create(&path)?;
        file.write_all(contents)?;
        file.sync_all()
    }

    fn remove(&self, name: &str) -> bool {
        self.resolve(name).and_then(fs::remove_file).is_ok()
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|p| p.is_file())
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.resolve(from)?, self.resolve(to)?)
    }

    fn replace_atomic(&self, name: &str, contents: &[u8]) -> io::Result<()> {
        let path = self.resolve(name)?;
        let dir = path.parent().unwrap_or(&self.root);

        let mut tmp = tempfile::Builder::new()
            .prefix(".cfgwiz")
            .suffix(".json")
            .tempfile_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}
