use camino::{Utf8Path, Utf8PathBuf};
use modsync_core::path_utils::ModPath;
use modsync_core::{plan_deletes, plan_downloads, DownloadStep, RemoteEntry, SyncStats};
use tracing::{debug, warn};

use crate::io_utils::rename_into_place;
use crate::sync::events::{EventSink, SyncEvent};
use crate::sync::local::scan_local_files;
use crate::sync::session::SessionHandle;
use crate::sync::{SyncError, SyncRequest};

/// One reconciliation pass: download missing mods, then delete extras.
pub struct Syncer {
    session: SessionHandle,
    remote_dir: String,
    local_root: Utf8PathBuf,
    suffix: String,
    events: EventSink,
}

impl Syncer {
    pub fn new(session: SessionHandle, req: &SyncRequest, events: EventSink) -> Self {
        Self {
            session,
            remote_dir: req.remote_dir.clone(),
            local_root: req.local_root.clone(),
            suffix: req.options.mod_suffix.clone(),
            events,
        }
    }

    pub async fn run_pass(&self) -> Result<SyncStats, SyncError> {
        let mut stats = SyncStats::default();

        self.session.connect().await?;
        let remote = self.list_remote().await?;
        self.download_missing(&remote, &mut stats).await?;
        self.delete_extra(&mut stats).await?;

        Ok(stats)
    }

    /// Listing of the remote directory with unusable names dropped.
    pub async fn list_remote(&self) -> Result<Vec<RemoteEntry>, SyncError> {
        let entries = self.session.list(&self.remote_dir).await?;
        Ok(entries
            .into_iter()
            .filter(|e| {
                let ok = ModPath::is_plain_name(&e.name);
                if !ok && e.name != "." && e.name != ".." {
                    warn!("Ignoring remote entry with unsafe name {:?}", e.name);
                }
                ok
            })
            .collect())
    }

    pub async fn download_missing(
        &self,
        remote: &[RemoteEntry],
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        tokio::fs::create_dir_all(&self.local_root)
            .await
            .map_err(|e| SyncError::filesystem(&self.local_root, e))?;

        let local = scan_local_files(&self.local_root).await?;
        let plan = plan_downloads(remote, &local, &self.suffix);
        debug!(
            "Download plan: {} to fetch, {} already present, {} local files",
            plan.fetches().count(),
            plan.skips().count(),
            local.len()
        );

        for step in plan.steps {
            if self.session.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            match step {
                DownloadStep::Skip(name) => {
                    self.events.emit(SyncEvent::Skipped { name });
                    stats.files_skipped += 1;
                }
                DownloadStep::Fetch(entry) => {
                    let bytes = self.fetch(&entry).await?;
                    stats.files_downloaded += 1;
                    stats.bytes_downloaded += bytes;
                }
            }
        }

        Ok(())
    }

    /// Download into `<name>.part` and rename into place once complete, so an
    /// interrupted transfer never leaves a file that looks finished.
    async fn fetch(&self, entry: &RemoteEntry) -> Result<u64, SyncError> {
        let target = self.local_root.join(&entry.name);
        let part = self.local_root.join(ModPath::part_name(&entry.name));
        let remote_path = ModPath::remote_file(&self.remote_dir, &entry.name);

        self.events.emit(SyncEvent::Downloading {
            name: entry.name.clone(),
            remote_path: remote_path.clone(),
        });

        let bytes = match self.session.download(&remote_path, &part).await {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_partial(&part).await;
                return Err(e);
            }
        };

        if let Some(expected) = entry.size {
            if expected != bytes {
                warn!(
                    "{} listed as {expected} bytes but {bytes} bytes were received",
                    entry.name
                );
            }
        }

        if let Err(e) = rename_into_place(&part, &target).await {
            discard_partial(&part).await;
            return Err(SyncError::filesystem(&target, e));
        }

        self.events.emit(SyncEvent::Downloaded {
            name: entry.name.clone(),
            bytes,
        });
        Ok(bytes)
    }

    /// Delete local files the server no longer lists.
    ///
    /// The remote directory is listed again so the decision reflects the
    /// server's state after the download pass.
    pub async fn delete_extra(&self, stats: &mut SyncStats) -> Result<(), SyncError> {
        let remote = self.list_remote().await?;
        let local = scan_local_files(&self.local_root).await?;

        for name in plan_deletes(&local, &remote) {
            if self.session.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            let path = self.local_root.join(&name);
            self.events.emit(SyncEvent::Deleted { name });
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| SyncError::filesystem(&path, e))?;
            stats.files_deleted += 1;
        }

        Ok(())
    }
}

async fn discard_partial(part: &Utf8Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => debug!("Removed partial download {part}"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial download {part}: {e}"),
    }
}
