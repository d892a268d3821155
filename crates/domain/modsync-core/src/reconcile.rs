use crate::{LocalFileSet, RemoteEntry};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStep {
    Fetch(RemoteEntry),
    /// Already present locally. Content is never compared.
    Skip(String),
}

/// Download decisions in remote listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    pub steps: Vec<DownloadStep>,
}

impl DownloadPlan {
    pub fn fetches(&self) -> impl Iterator<Item = &RemoteEntry> {
        self.steps.iter().filter_map(|s| match s {
            DownloadStep::Fetch(entry) => Some(entry),
            DownloadStep::Skip(_) => None,
        })
    }

    pub fn skips(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| match s {
            DownloadStep::Skip(name) => Some(name.as_str()),
            DownloadStep::Fetch(_) => None,
        })
    }
}

/// Select the remote files that must be downloaded.
///
/// Only regular files carrying `suffix` are considered. A file is skipped as
/// soon as a local file with the same name exists, whatever its content.
pub fn plan_downloads(remote: &[RemoteEntry], local: &LocalFileSet, suffix: &str) -> DownloadPlan {
    let mut seen = HashSet::new();
    let steps = remote
        .iter()
        .filter(|e| e.matches_suffix(suffix))
        .filter(|e| seen.insert(e.name.as_str()))
        .map(|e| {
            if local.contains(&e.name) {
                DownloadStep::Skip(e.name.clone())
            } else {
                DownloadStep::Fetch(e.clone())
            }
        })
        .collect();

    DownloadPlan { steps }
}

/// Local file names with no counterpart in the remote listing.
///
/// Every remote name counts, not only suffix matches, so a local `notes.txt`
/// survives as long as the server still lists a `notes.txt`.
pub fn plan_deletes(local: &LocalFileSet, remote: &[RemoteEntry]) -> Vec<String> {
    if local.is_empty() {
        return Vec::new();
    }
    let remote_names: HashSet<&str> = remote.iter().map(|e| e.name.as_str()).collect();

    local
        .iter()
        .filter(|name| !remote_names.contains(name))
        .map(str::to_string)
        .collect()
}
