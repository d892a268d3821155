pub mod console;
pub mod settings;

use camino::Utf8Path;
use modsync_infra::PrivilegeProbe;
use modsync_pipeline::{SyncError, SyncErrorKind};
use settings::{Settings, SettingsError};

pub const EXIT_OK: u8 = 0;
pub const EXIT_SYNC_FAILED: u8 = 1;
pub const EXIT_NOT_ELEVATED: u8 = 2;
pub const EXIT_CONFIG: u8 = 3;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Settings(_) => EXIT_CONFIG,
            CliError::Sync(e) if e.kind() == SyncErrorKind::Privilege => EXIT_NOT_ELEVATED,
            CliError::Sync(_) => EXIT_SYNC_FAILED,
        }
    }

    /// Line shown on the console. The elevation notice is printed bare.
    pub fn console_message(&self) -> String {
        match self {
            CliError::Sync(SyncError::NotElevated) => self.to_string(),
            other => format!("Error: {other}"),
        }
    }
}

/// Load and validate the settings at `path`.
///
/// A process that is not elevated is refused before the file is read or a
/// template is written. Only a readable file with `require_elevation: false`
/// lifts the gate.
pub fn load_settings(
    path: &Utf8Path,
    password: Option<String>,
    privileges: &dyn PrivilegeProbe,
) -> Result<Settings, CliError> {
    let elevated = privileges.is_elevated();
    if !elevated && !path.exists() {
        return Err(SyncError::NotElevated.into());
    }

    let settings = match Settings::load(path) {
        Ok(settings) => settings,
        Err(e) if !elevated => {
            tracing::debug!("Ignoring unreadable settings while not elevated: {e}");
            return Err(SyncError::NotElevated.into());
        }
        Err(e) => return Err(e.into()),
    };
    if settings.require_elevation && !elevated {
        return Err(SyncError::NotElevated.into());
    }

    let settings = settings.with_password(password);
    settings.validate()?;
    Ok(settings)
}
