use std::fs;
use std::io::{self, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::{BaseDirs, ProjectDirs};
use modsync_config::{
    clamp_connect_timeout, clamp_reconnect_interval, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_LOCAL_DIR, DEFAULT_MOD_SUFFIX, DEFAULT_PORT, DEFAULT_RECONNECT_INTERVAL_SECS,
    DEFAULT_REMOTE_DIR,
};
use modsync_infra::{Credentials, Endpoint, SftpOptions};
use modsync_pipeline::{SyncOptions, SyncRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const QUALIFIER: &str = "com";
const ORG: &str = "modsync";
const APP: &str = "modsync";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings file not found. A template was written to {path}; fill in the server details and run again.")]
    Missing { path: Utf8PathBuf },
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("Could not determine the {0} directory")]
    NoSystemDir(&'static str),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

/// Contents of `settings.json`. Missing keys fall back to the defaults.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub remote_dir: String,
    /// Relative to the per-user data folder unless absolute.
    pub local_dir: String,
    pub mod_suffix: String,
    pub reconnect_interval_secs: u64,
    pub connect_timeout_secs: u64,
    pub host_key_fingerprint: Option<String>,
    pub require_elevation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            remote_dir: DEFAULT_REMOTE_DIR.to_string(),
            local_dir: DEFAULT_LOCAL_DIR.to_string(),
            mod_suffix: DEFAULT_MOD_SUFFIX.to_string(),
            reconnect_interval_secs: DEFAULT_RECONNECT_INTERVAL_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            host_key_fingerprint: None,
            require_elevation: true,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remote_dir", &self.remote_dir)
            .field("local_dir", &self.local_dir)
            .field("mod_suffix", &self.mod_suffix)
            .field("reconnect_interval_secs", &self.reconnect_interval_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("host_key_fingerprint", &self.host_key_fingerprint)
            .field("require_elevation", &self.require_elevation)
            .finish()
    }
}

/// `settings.json` inside the per-user config directory.
pub fn default_settings_path() -> Result<Utf8PathBuf, SettingsError> {
    let proj_dirs =
        ProjectDirs::from(QUALIFIER, ORG, APP).ok_or(SettingsError::NoSystemDir("config"))?;
    let dir = utf8(proj_dirs.config_dir().to_path_buf())?;
    Ok(dir.join(SETTINGS_FILE))
}

/// Per-user application data folder (Roaming AppData on Windows).
pub fn user_data_dir() -> Result<Utf8PathBuf, SettingsError> {
    let base = BaseDirs::new().ok_or(SettingsError::NoSystemDir("data"))?;
    utf8(base.data_dir().to_path_buf())
}

fn utf8(path: std::path::PathBuf) -> Result<Utf8PathBuf, SettingsError> {
    Utf8PathBuf::from_path_buf(path).map_err(|p| SettingsError::NonUtf8Path(p.display().to_string()))
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// A missing file is replaced by a template holding the defaults and
    /// reported as [`SettingsError::Missing`], so the first run never talks
    /// to a half-configured server.
    pub fn load(path: &Utf8Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            Self::default().save(path)?;
            return Err(SettingsError::Missing {
                path: path.to_owned(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_owned(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_owned(),
                source,
            })?;
        debug!("Loaded settings from {path}: {settings:?}");
        Ok(settings)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other).map_err(write_err)?;
        atomic_write(path, json.as_bytes()).map_err(write_err)
    }

    /// A password given on the command line or in the environment wins over
    /// the one stored in the file.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        if let Some(password) = password {
            self.password = password;
        }
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let required = [
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
            ("remote_dir", &self.remote_dir),
            ("local_dir", &self.local_dir),
            ("mod_suffix", &self.mod_suffix),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "must not be empty".into(),
                });
            }
        }

        if self.port == 0 {
            return Err(SettingsError::Invalid {
                field: "port",
                reason: "must be between 1 and 65535".into(),
            });
        }
        if self.host.contains(char::is_whitespace) {
            return Err(SettingsError::Invalid {
                field: "host",
                reason: format!("{:?} contains whitespace", self.host),
            });
        }
        Ok(())
    }

    /// Local mods directory: `local_dir` under `data_dir`, or `local_dir`
    /// itself when it is absolute.
    pub fn local_root(&self, data_dir: &Utf8Path) -> Utf8PathBuf {
        let local = Utf8Path::new(&self.local_dir);
        if local.is_absolute() {
            local.to_owned()
        } else {
            data_dir.join(local)
        }
    }

    pub fn reconnect_interval(&self) -> Duration {
        let secs = clamp_reconnect_interval(self.reconnect_interval_secs);
        if secs != self.reconnect_interval_secs {
            warn!(
                "reconnect_interval_secs {} is out of range, using {secs}",
                self.reconnect_interval_secs
            );
        }
        Duration::from_secs(secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        let secs = clamp_connect_timeout(self.connect_timeout_secs);
        if secs != self.connect_timeout_secs {
            warn!(
                "connect_timeout_secs {} is out of range, using {secs}",
                self.connect_timeout_secs
            );
        }
        Duration::from_secs(secs)
    }

    pub fn sync_request(&self, data_dir: &Utf8Path) -> SyncRequest {
        SyncRequest {
            remote_dir: self.remote_dir.clone(),
            local_root: self.local_root(data_dir),
            options: SyncOptions {
                mod_suffix: self.mod_suffix.clone(),
                reconnect_interval: self.reconnect_interval(),
                require_elevation: self.require_elevation,
            },
        }
    }

    pub fn sftp_options(&self) -> SftpOptions {
        SftpOptions {
            endpoint: Endpoint {
                host: self.host.clone(),
                port: self.port,
            },
            credentials: Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            connect_timeout: self.connect_timeout(),
            host_key_fingerprint: self
                .host_key_fingerprint
                .as_deref()
                .map(str::trim)
                .filter(|fp| !fp.is_empty())
                .map(str::to_string),
        }
    }
}

fn atomic_write(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let tmp_path = Utf8PathBuf::from(format!("{path}.tmp"));

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path)?;
        }
        Err(e) => {
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }
    }

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Settings {
        Settings {
            host: "mods.example.net".into(),
            username: "player".into(),
            password: "hunter2".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_match_config_constants() {
        let s = Settings::default();
        assert_eq!(s.port, 7477);
        assert_eq!(s.remote_dir, "/mods/");
        assert_eq!(s.local_dir, ".minecraft/mods");
        assert_eq!(s.mod_suffix, ".jar");
        assert!(s.require_elevation);
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let mut s = filled();
        s.password.clear();
        let err = s.validate().unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "password", .. }));

        assert!(filled().validate().is_ok());
    }

    #[test]
    fn password_override_wins() {
        let s = filled().with_password(Some("from-env".into()));
        assert_eq!(s.password, "from-env");
        let s = filled().with_password(None);
        assert_eq!(s.password, "hunter2");
    }

    #[test]
    fn relative_local_dir_is_under_data_dir() {
        let s = filled();
        let root = s.local_root(Utf8Path::new("/home/player/.local/share"));
        assert_eq!(root, Utf8PathBuf::from("/home/player/.local/share/.minecraft/mods"));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_local_dir_is_used_as_is() {
        let s = Settings {
            local_dir: "/srv/game/mods".into(),
            ..filled()
        };
        assert_eq!(
            s.local_root(Utf8Path::new("/ignored")),
            Utf8PathBuf::from("/srv/game/mods")
        );
    }

    #[test]
    fn intervals_are_clamped() {
        let s = Settings {
            reconnect_interval_secs: 1,
            connect_timeout_secs: 10_000,
            ..filled()
        };
        assert_eq!(s.reconnect_interval(), Duration::from_secs(10));
        assert_eq!(s.connect_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn blank_fingerprint_means_unpinned() {
        let s = Settings {
            host_key_fingerprint: Some("  ".into()),
            ..filled()
        };
        assert!(s.sftp_options().host_key_fingerprint.is_none());
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", filled());
        assert!(!rendered.contains("hunter2"));
    }
}
