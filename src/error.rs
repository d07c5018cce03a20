use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DevlogError>;

#[derive(Error, Debug)]
pub enum DevlogError {
    #[error("{0}")]
    Validation(String),

    #[error("Setting '{key}' not found")]
    SettingNotFound { key: String },

    #[error("Error reading settings file")]
    SettingsUnreadable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not determine home directory (set HOME or DEVLOG_HOME)")]
    HomeDirNotFound,
}

impl DevlogError {
    pub fn validation(message: impl Into<String>) -> Self {
        DevlogError::Validation(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DevlogError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for faults the user cannot fix by changing their input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DevlogError::Io { .. } | DevlogError::Serialize(_) | DevlogError::HomeDirNotFound
        )
    }
}
