use std::env;
use std::path::{Path, PathBuf};

use dirs::home_dir;

use crate::error::{DevlogError, Result};

const APP_DIR: &str = ".devlog";
const SETTINGS_FILE: &str = "settings.json";
const SESSION_LOG_FILE: &str = "sessions.jsonl";
const HOME_OVERRIDE_VAR: &str = "DEVLOG_HOME";

/// Every file location a command touches.
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub global_dir: PathBuf,
    pub project_dir: PathBuf,
    pub global_settings: PathBuf,
    pub project_settings: PathBuf,
    pub session_log: PathBuf,
}

impl Paths {
    /// Derive the bundle from a global dir and a project dir. No I/O.
    pub fn new(global_dir: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        let global_dir = global_dir.into();
        let project_dir = project_dir.into();
        Self {
            global_settings: global_dir.join(SETTINGS_FILE),
            session_log: global_dir.join(SESSION_LOG_FILE),
            project_settings: project_dir.join(APP_DIR).join(SETTINGS_FILE),
            global_dir,
            project_dir,
        }
    }

    /// Resolve from the environment and the current directory.
    pub fn resolve() -> Result<Self> {
        let global_dir = global_dir_from(env::var(HOME_OVERRIDE_VAR).ok(), home_dir())?;
        let project_dir = env::current_dir().map_err(|e| DevlogError::io(".", e))?;
        let paths = Self::new(global_dir, project_dir);
        tracing::debug!(
            global_dir = %paths.global_dir.display(),
            project_dir = %paths.project_dir.display(),
            "resolved paths"
        );
        Ok(paths)
    }

    /// Directory that holds the project settings document.
    pub fn project_settings_dir(&self) -> &Path {
        self.project_settings
            .parent()
            .unwrap_or(self.project_dir.as_path())
    }

    /// The session grouping key for this project.
    pub fn project_key(&self) -> String {
        self.project_dir.to_string_lossy().to_string()
    }
}

fn global_dir_from(override_dir: Option<String>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home.map(|h| h.join(APP_DIR))
        .ok_or(DevlogError::HomeDirNotFound)
}
