use camino::Utf8Path;
use modsync_core::LocalFileSet;
use walkdir::WalkDir;

use crate::sync::SyncError;

/// Names of the regular files directly inside `root`. Subdirectories are not
/// descended into and are never part of the set.
pub async fn scan_local_files(root: &Utf8Path) -> Result<LocalFileSet, SyncError> {
    let root = root.to_owned();
    let join_root = root.clone();

    tokio::task::spawn_blocking(move || {
        let mut files = LocalFileSet::new();

        for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SyncError::filesystem(&root, e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => {
                    files.insert(name);
                }
                None => tracing::warn!(
                    "Ignoring local file with non UTF-8 name: {}",
                    entry.path().display()
                ),
            }
        }

        Ok::<LocalFileSet, SyncError>(files)
    })
    .await
    .map_err(|e| SyncError::filesystem(join_root, std::io::Error::other(e)))?
}
