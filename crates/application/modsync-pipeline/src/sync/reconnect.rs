use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::sync::session::SessionHandle;

/// Periodically ask the session actor to cycle its connection.
///
/// The first tick fires one full `period` after the call. The task stops when
/// `cancel` fires or the actor is gone.
pub fn spawn_reconnect_timer(
    session: SessionHandle,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    debug!("Reconnect timer fired after {:?}", period);
                    if !session.request_refresh().await {
                        break;
                    }
                }
            }
        }
        debug!("Reconnect timer stopped");
    })
}
