use std::collections::BTreeSet;

pub mod path_utils;
pub mod reconcile;

pub use reconcile::{plan_deletes, plan_downloads, DownloadPlan, DownloadStep};

/// One item of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
        }
    }

    /// True when this entry is a regular file whose name carries `suffix`.
    pub fn matches_suffix(&self, suffix: &str) -> bool {
        !self.is_dir && self.name.ends_with(suffix)
    }
}

/// Names of the regular files currently present in the local target directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFileSet {
    names: BTreeSet<String>,
}

impl LocalFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LocalFileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-pass counters reported back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub files_downloaded: u64,
    pub files_skipped: u64,
    pub files_deleted: u64,
    pub bytes_downloaded: u64,
}
