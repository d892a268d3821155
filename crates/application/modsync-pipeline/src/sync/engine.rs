use std::time::Duration;

use modsync_core::SyncStats;
use modsync_infra::{PrivilegeProbe, TransferClient};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info};

use crate::sync::events::EventSink;
use crate::sync::execute::Syncer;
use crate::sync::reconnect::spawn_reconnect_timer;
use crate::sync::session::{SessionActor, SessionHandle};
use crate::sync::{SyncError, SyncRequest};

/// Session actor plus reconnect timer, torn down together.
///
/// `close` is the orderly path. If the scope is dropped without it, the drop
/// guard cancels both tasks and the actor still disconnects on its way out.
pub struct SessionScope {
    handle: SessionHandle,
    actor: JoinHandle<()>,
    timer: JoinHandle<()>,
    timer_cancel: CancellationToken,
    guard: DropGuard,
}

impl SessionScope {
    pub fn open(
        client: Box<dyn TransferClient>,
        events: EventSink,
        reconnect_interval: Duration,
        cancel: &CancellationToken,
    ) -> Self {
        let scope_cancel = cancel.child_token();
        let (handle, actor) = SessionActor::spawn(client, events, scope_cancel.clone());

        let timer_cancel = scope_cancel.child_token();
        let timer = spawn_reconnect_timer(handle.clone(), reconnect_interval, timer_cancel.clone());

        Self {
            handle,
            actor,
            timer,
            timer_cancel,
            guard: scope_cancel.drop_guard(),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the timer, then disconnect and stop the actor.
    pub async fn close(self) {
        self.timer_cancel.cancel();
        if let Err(e) = self.timer.await {
            error!("Reconnect timer task failed: {e}");
        }

        self.handle.shutdown().await;
        if let Err(e) = self.actor.await {
            error!("Session task failed: {e}");
        }

        let _ = self.guard.disarm();
        debug!("Session scope closed");
    }
}

/// Run one synchronization pass end to end.
///
/// The privilege gate is checked before any network or filesystem work.
/// Teardown (timer stop, best-effort disconnect) runs whatever the pass
/// returns.
pub async fn run(
    req: SyncRequest,
    client: Box<dyn TransferClient>,
    privileges: &dyn PrivilegeProbe,
    events: EventSink,
    cancel: CancellationToken,
) -> Result<SyncStats, SyncError> {
    if req.options.require_elevation && !privileges.is_elevated() {
        return Err(SyncError::NotElevated);
    }

    info!(
        "Syncing {} into {} (suffix {})",
        req.remote_dir, req.local_root, req.options.mod_suffix
    );

    let scope = SessionScope::open(client, events.clone(), req.options.reconnect_interval, &cancel);
    let syncer = Syncer::new(scope.handle(), &req, events);

    let result = syncer.run_pass().await;
    scope.close().await;

    match &result {
        Ok(stats) => info!(
            "Sync finished: {} downloaded, {} skipped, {} deleted",
            stats.files_downloaded, stats.files_skipped, stats.files_deleted
        ),
        Err(e) => debug!("Sync failed: {e}"),
    }
    result
}
