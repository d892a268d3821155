use std::io::{self, IsTerminal, Write};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use modsync_pipeline::SyncEvent;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Status line printed for an event, if any. Completed downloads are only
/// logged; the console already showed the "Download file" line.
pub fn status_line(event: &SyncEvent) -> Option<String> {
    match event {
        SyncEvent::Downloaded { .. } => None,
        other => Some(other.to_string()),
    }
}

/// Print status lines until every sender is gone.
pub fn spawn_printer(mut rx: UnboundedReceiver<SyncEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = status_line(&event) {
                println!("{line}");
            }
        }
    })
}

/// Restores cooked mode even if reading the key fails.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

pub fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Block until a single key is pressed.
pub fn wait_for_keypress() -> io::Result<()> {
    io::stdout().flush()?;
    enable_raw_mode()?;
    let _guard = RawModeGuard;

    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}
