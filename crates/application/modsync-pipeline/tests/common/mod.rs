#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use modsync_core::RemoteEntry;
use modsync_infra::{PrivilegeProbe, TransferClient, TransferError};
use modsync_pipeline::{EventSink, SyncEvent, SyncOptions, SyncRequest};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;

pub const REMOTE_DIR: &str = "/mods/";

/// In-memory stand-in for the SFTP server, shared with the client under test.
#[derive(Debug, Default)]
pub struct FakeServer {
    pub files: BTreeMap<String, Vec<u8>>,
    pub dirs: Vec<String>,
    pub connected: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub lists: usize,
    pub downloads: Vec<String>,
    pub listed_paths: Vec<String>,
    pub fail_connect: bool,
    pub fail_list: bool,
    /// Name whose download writes half of the bytes and then errors.
    pub fail_download: Option<String>,
    /// Silently drop the session right after the next successful listing.
    pub drop_after_list: bool,
    /// Listing never completes; the caller has to cancel.
    pub stall_list: bool,
}

#[derive(Clone, Default)]
pub struct FakeRemote(Arc<Mutex<FakeServer>>);

impl FakeRemote {
    pub fn with_files(files: &[(&str, &[u8])]) -> Self {
        let remote = Self::default();
        {
            let mut server = remote.server();
            for (name, data) in files {
                server.files.insert((*name).to_string(), data.to_vec());
            }
        }
        remote
    }

    pub fn server(&self) -> MutexGuard<'_, FakeServer> {
        self.0.lock().unwrap()
    }

    pub fn client(&self) -> Box<dyn TransferClient> {
        Box::new(FakeClient {
            remote: self.clone(),
        })
    }
}

struct FakeClient {
    remote: FakeRemote,
}

#[async_trait::async_trait]
impl TransferClient for FakeClient {
    fn is_connected(&self) -> bool {
        self.remote.server().connected
    }

    async fn connect(&mut self) -> Result<(), TransferError> {
        let mut server = self.remote.server();
        if server.fail_connect {
            return Err(TransferError::Connect {
                endpoint: "fake:7477".into(),
                message: "connection refused".into(),
            });
        }
        if !server.connected {
            server.connected = true;
            server.connects += 1;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransferError> {
        let mut server = self.remote.server();
        if server.connected {
            server.connected = false;
            server.disconnects += 1;
        }
        Ok(())
    }

    async fn list_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, TransferError> {
        let stall = self.remote.server().stall_list;
        if stall {
            std::future::pending::<()>().await;
        }

        let mut server = self.remote.server();
        if !server.connected {
            return Err(TransferError::NotConnected);
        }
        server.lists += 1;
        server.listed_paths.push(path.to_string());
        if server.fail_list {
            return Err(TransferError::List {
                path: path.to_string(),
                message: "endpoint down".into(),
            });
        }

        let mut entries = vec![RemoteEntry::dir("."), RemoteEntry::dir("..")];
        entries.extend(
            server
                .files
                .iter()
                .map(|(name, data)| RemoteEntry::file(name.clone(), Some(data.len() as u64))),
        );
        entries.extend(server.dirs.iter().map(|d| RemoteEntry::dir(d.clone())));

        if server.drop_after_list {
            server.drop_after_list = false;
            server.connected = false;
        }
        Ok(entries)
    }

    async fn download(
        &mut self,
        remote_path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, TransferError> {
        let name = remote_path.rsplit('/').next().unwrap_or_default().to_string();
        let (data, fail) = {
            let mut server = self.remote.server();
            if !server.connected {
                return Err(TransferError::NotConnected);
            }
            let data = server.files.get(&name).cloned().ok_or_else(|| {
                TransferError::Download {
                    path: remote_path.to_string(),
                    message: "no such file".into(),
                }
            })?;
            let fail = server.fail_download.as_deref() == Some(name.as_str());
            if !fail {
                server.downloads.push(name.clone());
            }
            (data, fail)
        };

        if fail {
            sink.write_all(&data[..data.len() / 2]).await?;
            return Err(TransferError::Download {
                path: remote_path.to_string(),
                message: "connection reset".into(),
            });
        }

        sink.write_all(&data).await?;
        Ok(data.len() as u64)
    }
}

pub struct FixedPrivileges(pub bool);

impl PrivilegeProbe for FixedPrivileges {
    fn is_elevated(&self) -> bool {
        self.0
    }
}

pub fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("mods")).unwrap()
}

pub fn request(local_root: &Utf8Path) -> SyncRequest {
    SyncRequest {
        remote_dir: REMOTE_DIR.to_string(),
        local_root: local_root.to_owned(),
        options: SyncOptions {
            require_elevation: false,
            reconnect_interval: Duration::from_secs(180),
            ..SyncOptions::default()
        },
    }
}

pub fn event_channel() -> (EventSink, UnboundedReceiver<SyncEvent>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (EventSink::new(tx), rx)
}

pub fn drain(rx: &mut UnboundedReceiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

pub fn local_names(root: &Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
