use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

/// Console-visible state transitions of a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Connected,
    /// The reconnect timer is cycling the session.
    Reconnecting,
    Reconnected,
    /// A dropped session was reopened before the next remote call.
    Restored,
    Downloading { name: String, remote_path: String },
    Downloaded { name: String, bytes: u64 },
    Skipped { name: String },
    Deleted { name: String },
    Disconnected,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Connected => write!(f, "Connection to SFTP server established."),
            SyncEvent::Reconnecting => write!(f, "Session timed out. Reconnecting..."),
            SyncEvent::Reconnected => write!(f, "Connection re-established."),
            SyncEvent::Restored => write!(f, "Connection to SFTP server re-established."),
            SyncEvent::Downloading { name, remote_path } => {
                write!(f, "Download file {name} from: {remote_path}")
            }
            SyncEvent::Downloaded { name, bytes } => write!(f, "Downloaded {name} ({bytes} bytes)"),
            SyncEvent::Skipped { name } => {
                write!(f, "File {name} already exists, skipping downloading")
            }
            SyncEvent::Deleted { name } => write!(f, "Deleting extra file {name}"),
            SyncEvent::Disconnected => write!(f, "Disconnected from SFTP server."),
        }
    }
}

/// Fan-out point for `SyncEvent`s. Every event is also logged.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<SyncEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<SyncEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that only logs.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: SyncEvent) {
        tracing::info!("{event}");
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_forwards_events_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        sink.emit(SyncEvent::Connected);
        sink.emit(SyncEvent::Skipped {
            name: "a.jar".into(),
        });

        assert_eq!(rx.try_recv().unwrap(), SyncEvent::Connected);
        assert_eq!(
            rx.try_recv().unwrap().to_string(),
            "File a.jar already exists, skipping downloading"
        );
    }

    #[test]
    fn silent_sink_does_not_panic_without_receiver() {
        EventSink::silent().emit(SyncEvent::Disconnected);
    }
}
