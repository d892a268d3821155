use modsync_core::RemoteEntry;
use std::fmt;
use thiserror::Error;
use tokio::io::AsyncWrite;

pub mod sftp;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("could not connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },
    #[error("connecting to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },
    #[error("authentication rejected for user '{username}'")]
    AuthRejected { username: String },
    #[error("server host key does not match the configured fingerprint {expected}")]
    HostKeyMismatch { expected: String },
    #[error("session is not connected")]
    NotConnected,
    #[error("listing {path} failed: {message}")]
    List { path: String, message: String },
    #[error("downloading {path} failed: {message}")]
    Download { path: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Errors raised while establishing the session, as opposed to errors on
    /// an operation against an open one.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            TransferError::Connect { .. }
                | TransferError::Timeout { .. }
                | TransferError::AuthRejected { .. }
                | TransferError::HostKeyMismatch { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Capabilities the sync pipeline needs from a file-transfer client.
///
/// Implementations keep at most one live session. `connect` on a connected
/// client is a no-op; `disconnect` on a disconnected one as well.
#[async_trait::async_trait]
pub trait TransferClient: Send {
    fn is_connected(&self) -> bool;

    async fn connect(&mut self) -> Result<(), TransferError>;

    async fn disconnect(&mut self) -> Result<(), TransferError>;

    /// Materialized listing of `path`, in server order.
    async fn list_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, TransferError>;

    /// Stream the file at `remote_path` into `sink`, returning the byte count.
    async fn download(
        &mut self,
        remote_path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, TransferError>;
}
