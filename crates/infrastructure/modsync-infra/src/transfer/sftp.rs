use std::sync::Arc;
use std::time::Duration;

use modsync_core::RemoteEntry;
use russh::client;
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::{Credentials, Endpoint, TransferClient, TransferError};

#[derive(Debug, Clone)]
pub struct SftpOptions {
    pub endpoint: Endpoint,
    pub credentials: Credentials,
    pub connect_timeout: Duration,
    /// Expected SHA-256 host key fingerprint (base64, with or without the
    /// `SHA256:` prefix). `None` accepts any key.
    pub host_key_fingerprint: Option<String>,
}

struct HostKeyPolicy {
    expected: Option<String>,
}

#[async_trait::async_trait]
impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        let actual = server_public_key.fingerprint();
        Ok(fingerprint_matches(self.expected.as_deref(), &actual))
    }
}

fn normalize_fingerprint(fp: &str) -> &str {
    let fp = fp.trim();
    fp.strip_prefix("SHA256:")
        .unwrap_or(fp)
        .trim_end_matches('=')
}

pub(crate) fn fingerprint_matches(expected: Option<&str>, actual: &str) -> bool {
    match expected {
        None => {
            warn!("Accepting unverified server host key SHA256:{actual}");
            true
        }
        Some(expected) => {
            let ok = normalize_fingerprint(expected) == normalize_fingerprint(actual);
            if !ok {
                warn!("Server host key SHA256:{actual} does not match configured {expected}");
            }
            ok
        }
    }
}

struct SftpConnection {
    handle: client::Handle<HostKeyPolicy>,
    sftp: SftpSession,
}

/// `TransferClient` over SSH password auth and the `sftp` subsystem.
pub struct SftpTransferClient {
    options: SftpOptions,
    conn: Option<SftpConnection>,
}

impl SftpTransferClient {
    pub fn new(options: SftpOptions) -> Self {
        Self {
            options,
            conn: None,
        }
    }

    fn connect_error(&self, err: impl std::fmt::Display) -> TransferError {
        TransferError::Connect {
            endpoint: self.options.endpoint.to_string(),
            message: err.to_string(),
        }
    }

    async fn open(&self) -> Result<SftpConnection, TransferError> {
        let endpoint = &self.options.endpoint;
        let policy = HostKeyPolicy {
            expected: self.options.host_key_fingerprint.clone(),
        };
        let config = Arc::new(client::Config::default());

        let mut handle = client::connect(config, (endpoint.host.as_str(), endpoint.port), policy)
            .await
            .map_err(|e| match e {
                russh::Error::UnknownKey => TransferError::HostKeyMismatch {
                    expected: self
                        .options
                        .host_key_fingerprint
                        .clone()
                        .unwrap_or_default(),
                },
                other => self.connect_error(other),
            })?;

        let creds = &self.options.credentials;
        let authenticated = handle
            .authenticate_password(creds.username.clone(), creds.password.clone())
            .await
            .map_err(|e| self.connect_error(e))?;
        if !authenticated {
            return Err(TransferError::AuthRejected {
                username: creds.username.clone(),
            });
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| self.connect_error(e))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| self.connect_error(e))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| self.connect_error(e))?;

        Ok(SftpConnection { handle, sftp })
    }

    fn session(&self) -> Result<&SftpConnection, TransferError> {
        self.conn
            .as_ref()
            .filter(|c| !c.handle.is_closed())
            .ok_or(TransferError::NotConnected)
    }
}

#[async_trait::async_trait]
impl TransferClient for SftpTransferClient {
    fn is_connected(&self) -> bool {
        self.session().is_ok()
    }

    async fn connect(&mut self) -> Result<(), TransferError> {
        if self.is_connected() {
            return Ok(());
        }
        // Drop any half-dead connection before replacing it.
        self.conn = None;

        let timeout = self.options.connect_timeout;
        debug!("Connecting to {}", self.options.endpoint);
        let conn = tokio::time::timeout(timeout, self.open())
            .await
            .map_err(|_| TransferError::Timeout {
                endpoint: self.options.endpoint.to_string(),
                secs: timeout.as_secs(),
            })??;

        self.conn = Some(conn);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransferError> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        if conn.handle.is_closed() {
            return Ok(());
        }
        drop(conn.sftp);
        conn.handle
            .disconnect(russh::Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| self.connect_error(e))
    }

    async fn list_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, TransferError> {
        let conn = self.session()?;
        let entries = conn
            .sftp
            .read_dir(path)
            .await
            .map_err(|e| TransferError::List {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Ok(entries
            .map(|entry| RemoteEntry {
                is_dir: entry.file_type().is_dir(),
                size: entry.metadata().size,
                name: entry.file_name(),
            })
            .collect())
    }

    async fn download(
        &mut self,
        remote_path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, TransferError> {
        let conn = self.session()?;
        let download_error = |e: &dyn std::fmt::Display| TransferError::Download {
            path: remote_path.to_string(),
            message: e.to_string(),
        };

        let file = conn
            .sftp
            .open(remote_path)
            .await
            .map_err(|e| download_error(&e))?;
        let mut file = Box::pin(file);

        let bytes = tokio::io::copy(&mut file, sink)
            .await
            .map_err(|e| download_error(&e))?;
        sink.flush().await?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_comparison_ignores_prefix_and_padding() {
        let actual = "nThbg6kXUpJWGl7E1IGOCspRomTxdCARLviKw6E5SY8";
        assert!(fingerprint_matches(
            Some("SHA256:nThbg6kXUpJWGl7E1IGOCspRomTxdCARLviKw6E5SY8="),
            actual
        ));
        assert!(fingerprint_matches(Some(actual), actual));
        assert!(!fingerprint_matches(Some("SHA256:other"), actual));
    }

    #[test]
    fn missing_fingerprint_accepts_any_key() {
        assert!(fingerprint_matches(None, "anything"));
    }

    #[tokio::test]
    async fn operations_before_connect_report_not_connected() {
        let mut client = SftpTransferClient::new(SftpOptions {
            endpoint: Endpoint {
                host: "127.0.0.1".into(),
                port: 1,
            },
            credentials: Credentials {
                username: "u".into(),
                password: "p".into(),
            },
            connect_timeout: Duration::from_secs(1),
            host_key_fingerprint: None,
        });

        assert!(!client.is_connected());
        assert!(matches!(
            client.list_dir("/mods/").await,
            Err(TransferError::NotConnected)
        ));
        // Disconnecting an idle client is a no-op.
        client.disconnect().await.unwrap();
    }
}
