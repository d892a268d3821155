//! Single owner of the transfer client.
//!
//! All connect / disconnect / list / download calls run inside one task, in
//! the order their commands arrive. The reconnect timer and the sync pass both
//! go through a [`SessionHandle`], so a forced reconnect can never overlap a
//! transfer.

use camino::{Utf8Path, Utf8PathBuf};
use modsync_core::RemoteEntry;
use modsync_infra::TransferClient;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::sync::events::{EventSink, SyncEvent};
use crate::sync::SyncError;

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

type Reply<T> = oneshot::Sender<Result<T, SyncError>>;

#[derive(Debug)]
pub enum SessionCommand {
    Connect {
        reply: Reply<()>,
    },
    List {
        path: String,
        reply: Reply<Vec<RemoteEntry>>,
    },
    /// Stream `remote_path` into a newly created file at `dest`.
    Download {
        remote_path: String,
        dest: Utf8PathBuf,
        reply: Reply<u64>,
    },
    /// Cycle a connected session. No-op while disconnected.
    Refresh,
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

pub struct SessionActor {
    client: Box<dyn TransferClient>,
    rx: mpsc::Receiver<SessionCommand>,
    state: watch::Sender<SessionState>,
    events: EventSink,
    cancel: CancellationToken,
    ever_connected: bool,
}

impl SessionActor {
    /// Move `client` into a new actor task.
    ///
    /// The task ends on `Shutdown`, when `cancel` fires, or once every handle
    /// is dropped. It disconnects the client on the way out in all three cases.
    pub fn spawn(
        client: Box<dyn TransferClient>,
        events: EventSink,
        cancel: CancellationToken,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);

        let actor = SessionActor {
            client,
            rx,
            state: state_tx,
            events,
            cancel: cancel.clone(),
            ever_connected: false,
        };
        let task = tokio::spawn(actor.run());

        let handle = SessionHandle {
            tx,
            state: state_rx,
            cancel,
        };
        (handle, task)
    }

    async fn run(mut self) {
        let cancel = self.cancel.clone();

        loop {
            let cmd = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
            };

            match cmd {
                SessionCommand::Connect { reply } => {
                    let res = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(SyncError::Cancelled),
                        res = self.connect() => res,
                    };
                    let _ = reply.send(res);
                }
                SessionCommand::List { path, reply } => {
                    let res = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(SyncError::Cancelled),
                        res = self.list(&path) => res,
                    };
                    let _ = reply.send(res);
                }
                SessionCommand::Download {
                    remote_path,
                    dest,
                    reply,
                } => {
                    let res = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(SyncError::Cancelled),
                        res = self.download(&remote_path, &dest) => res,
                    };
                    let _ = reply.send(res);
                }
                SessionCommand::Refresh => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {}
                        _ = self.refresh() => {}
                    }
                }
                SessionCommand::Shutdown { reply } => {
                    self.close().await;
                    let _ = reply.send(());
                    return;
                }
            }
        }

        self.close().await;
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Connect unless already connected. Doubles as the reconnect-before-use
    /// check for every remote operation.
    async fn connect(&mut self) -> Result<(), SyncError> {
        if self.client.is_connected() {
            self.set_state(SessionState::Connected);
            return Ok(());
        }

        self.set_state(SessionState::Connecting);
        match self.client.connect().await {
            Ok(()) => {
                self.set_state(SessionState::Connected);
                let event = if self.ever_connected {
                    SyncEvent::Restored
                } else {
                    SyncEvent::Connected
                };
                self.ever_connected = true;
                self.events.emit(event);
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Disconnected);
                Err(SyncError::Connection(e))
            }
        }
    }

    async fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        self.connect().await?;
        let entries = self.client.list_dir(path).await?;
        debug!("Listed {} entries under {path}", entries.len());
        Ok(entries)
    }

    async fn download(&mut self, remote_path: &str, dest: &Utf8Path) -> Result<u64, SyncError> {
        self.connect().await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| SyncError::filesystem(dest, e))?;
        let bytes = self.client.download(remote_path, &mut file).await?;
        file.sync_all()
            .await
            .map_err(|e| SyncError::filesystem(dest, e))?;

        Ok(bytes)
    }

    async fn refresh(&mut self) {
        if !self.client.is_connected() {
            debug!("Reconnect tick skipped, session is not connected");
            return;
        }

        if let Err(e) = self.client.disconnect().await {
            warn!("Disconnect before reconnect failed: {e}");
        }
        self.set_state(SessionState::Disconnected);
        self.events.emit(SyncEvent::Reconnecting);

        self.set_state(SessionState::Connecting);
        match self.client.connect().await {
            Ok(()) => {
                self.set_state(SessionState::Connected);
                self.events.emit(SyncEvent::Reconnected);
            }
            Err(e) => {
                // The next remote operation retries through `connect`.
                self.set_state(SessionState::Disconnected);
                warn!("Reconnect failed: {e}");
            }
        }
    }

    async fn close(&mut self) {
        if self.client.is_connected() {
            if let Err(e) = self.client.disconnect().await {
                warn!("Disconnect failed: {e}");
            }
            self.events.emit(SyncEvent::Disconnected);
        }
        self.set_state(SessionState::Disconnected);
    }
}

/// Cloneable front door to the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SyncError::SessionClosed)?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SyncError::Cancelled),
            res = rx => res.map_err(|_| SyncError::SessionClosed)?,
        }
    }

    pub async fn connect(&self) -> Result<(), SyncError> {
        self.request(|reply| SessionCommand::Connect { reply }).await
    }

    pub async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        let path = path.to_string();
        self.request(|reply| SessionCommand::List { path, reply })
            .await
    }

    pub async fn download(&self, remote_path: &str, dest: &Utf8Path) -> Result<u64, SyncError> {
        let remote_path = remote_path.to_string();
        let dest = dest.to_owned();
        self.request(|reply| SessionCommand::Download {
            remote_path,
            dest,
            reply,
        })
        .await
    }

    /// Ask the actor to cycle the session. Returns `false` once the actor is gone.
    pub async fn request_refresh(&self) -> bool {
        self.tx.send(SessionCommand::Refresh).await.is_ok()
    }

    /// Disconnect and stop the actor. Safe to call more than once.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(SessionCommand::Shutdown { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
