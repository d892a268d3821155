use std::time::Duration;

use camino::Utf8PathBuf;
use modsync_infra::TransferError;

pub mod engine;
pub mod events;
pub mod execute;
pub mod local;
pub mod reconnect;
pub mod session;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Only remote files ending with this suffix are downloaded.
    pub mod_suffix: String,
    pub reconnect_interval: Duration,
    /// Refuse to run unless the process is elevated.
    pub require_elevation: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mod_suffix: modsync_config::DEFAULT_MOD_SUFFIX.to_string(),
            reconnect_interval: Duration::from_secs(
                modsync_config::DEFAULT_RECONNECT_INTERVAL_SECS,
            ),
            require_elevation: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub remote_dir: String,
    pub local_root: Utf8PathBuf,
    pub options: SyncOptions,
}

/// High-level error type for sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("You need to run the application as administrator.")]
    NotElevated,
    #[error("Connection error: {0}")]
    Connection(#[source] TransferError),
    #[error("Transfer error: {0}")]
    Transfer(#[source] TransferError),
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Session task stopped unexpectedly")]
    SessionClosed,
    #[error("Sync cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    Privilege,
    Connection,
    Transfer,
    Filesystem,
    Cancelled,
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::NotElevated => SyncErrorKind::Privilege,
            SyncError::Connection(_) => SyncErrorKind::Connection,
            SyncError::Transfer(_) | SyncError::SessionClosed => SyncErrorKind::Transfer,
            SyncError::Filesystem { .. } => SyncErrorKind::Filesystem,
            SyncError::Cancelled => SyncErrorKind::Cancelled,
        }
    }

    pub(crate) fn filesystem(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        SyncError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<TransferError> for SyncError {
    fn from(err: TransferError) -> Self {
        if err.is_connection() {
            SyncError::Connection(err)
        } else {
            SyncError::Transfer(err)
        }
    }
}

pub use engine::run;
pub use events::{EventSink, SyncEvent};
pub use execute::Syncer;
pub use session::{SessionHandle, SessionState};
