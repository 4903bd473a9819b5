//! Tunables shared by the document store and the wizard.

use clap::ValueEnum;

/// Default upper bound on a document file, in bytes.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 64 * 1024;

/// How a committed document replaces the file it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReplacePolicy {
    /// Remove the old file, then create it again. A failed create loses the
    /// previous contents.
    #[default]
    RemoveThenWrite,
    /// Stage the new contents next to the file and rename over it.
    TempThenRename,
}

/// What to do with integer input that does not start with a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerPolicy {
    /// Store 0.
    #[default]
    Lenient,
    /// Keep the cursor on the key and ask again.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub replace_policy: ReplacePolicy,
    pub integer_policy: IntegerPolicy,
    /// Documents larger than this are refused before parsing.
    pub max_document_bytes: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            replace_policy: ReplacePolicy::default(),
            integer_policy: IntegerPolicy::default(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}
