//! Central configuration constants for runtime limits and defaults.

/// Default SFTP port of the mod server.
pub const DEFAULT_PORT: u16 = 7477;

/// Remote directory listed on every pass.
pub const DEFAULT_REMOTE_DIR: &str = "/mods/";

/// Local target, relative to the per-user application data folder.
pub const DEFAULT_LOCAL_DIR: &str = ".minecraft/mods";

/// Only remote files with this suffix are downloaded.
pub const DEFAULT_MOD_SUFFIX: &str = ".jar";

/// Interval between forced reconnects (seconds).
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 180;

/// Minimum allowed reconnect interval (seconds).
pub const MIN_RECONNECT_INTERVAL_SECS: u64 = 10;

/// Maximum allowed reconnect interval (seconds).
pub const MAX_RECONNECT_INTERVAL_SECS: u64 = 3600;

/// Default bound on a single connect attempt (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Minimum allowed connect timeout (seconds).
pub const MIN_CONNECT_TIMEOUT_SECS: u64 = 1;

/// Maximum allowed connect timeout (seconds).
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

/// Convenience function to clamp a reconnect interval into allowed range.
pub fn clamp_reconnect_interval(secs: u64) -> u64 {
    secs.clamp(MIN_RECONNECT_INTERVAL_SECS, MAX_RECONNECT_INTERVAL_SECS)
}

/// Convenience function to clamp a connect timeout into allowed range.
pub fn clamp_connect_timeout(secs: u64) -> u64 {
    secs.clamp(MIN_CONNECT_TIMEOUT_SECS, MAX_CONNECT_TIMEOUT_SECS)
}
