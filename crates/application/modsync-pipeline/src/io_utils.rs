use std::io;
use std::path::Path;
use std::time::Duration;

/// Rename with exponential backoff. Only transient lock errors are retried.
pub async fn rename_into_place<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> io::Result<()> {
    let max_attempts = 6u32;
    let mut attempt = 0u32;
    let mut backoff = Duration::from_millis(50);

    loop {
        match tokio::fs::rename(&from, &to).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts || !is_transient(&e) {
                    return Err(e);
                }
                tracing::debug!(
                    "Rename {} attempt {attempt} failed: {e}",
                    from.as_ref().display()
                );
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, Duration::from_millis(1000));
            }
        }
    }
}

/// Errors raised while another process briefly holds the file open.
/// These only occur on Windows; everywhere else a failed rename is final.
fn is_transient(e: &io::Error) -> bool {
    if cfg!(windows) {
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        matches!(e.raw_os_error(), Some(32) | Some(33))
            || e.kind() == io::ErrorKind::PermissionDenied
    } else {
        false
    }
}
