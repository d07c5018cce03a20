use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::duration::{elapsed_label, elapsed_minutes};
use crate::error::{DevlogError, Result};
use crate::fs_ops::FileOps;
use crate::ledger::Ledger;
use crate::models::{LogEntry, SessionState};
use crate::paths::Paths;
use crate::settings::{self, Settings, SettingsResolver};

/// The user-facing operations. Each call re-reads everything it needs from
/// disk and returns the text to print.
pub struct Commands<'a, F: FileOps> {
    fs: &'a F,
    paths: &'a Paths,
}

impl<'a, F: FileOps> Commands<'a, F> {
    pub fn new(fs: &'a F, paths: &'a Paths) -> Self {
        Commands { fs, paths }
    }

    fn ledger(&self) -> Ledger<'a, F> {
        Ledger::new(self.fs, &self.paths.session_log)
    }

    fn settings(&self) -> SettingsResolver<'a, F> {
        SettingsResolver::new(self.fs, self.paths)
    }

    pub fn session_state(&self) -> Result<SessionState> {
        let entry = self.ledger().active_session(&self.paths.project_key())?;
        Ok(entry.into())
    }

    pub fn start(&self, message: &str, now: DateTime<Utc>) -> Result<String> {
        let message = required_message(message, "start")?;

        if let SessionState::Active(existing) = self.session_state()? {
            return Ok(format!(
                "⚠️  Session already active: \"{}\" (running for {})\n\
                 Stop it first with: devlog stop \"<what you accomplished>\"",
                existing.message,
                elapsed_label(existing.timestamp, now)
            ));
        }

        self.fs
            .ensure_dir(&self.paths.global_dir)
            .map_err(|e| DevlogError::io(&self.paths.global_dir, e))?;
        let entry = LogEntry::start(message, &self.paths.project_key(), now);
        self.ledger().record(&entry)?;
        Ok(format!("Started session: \"{}\"", message))
    }

    pub fn stop(&self, message: &str, now: DateTime<Utc>) -> Result<String> {
        let message = required_message(message, "stop")?;

        let SessionState::Active(started) = self.session_state()? else {
            return Ok("No active session to stop".to_string());
        };

        let entry = LogEntry::stop(message, &self.paths.project_key(), now);
        self.ledger().record(&entry)?;
        Ok(format!(
            "Stopped session: \"{}\" (duration: {})",
            message,
            elapsed_label(started.timestamp, now)
        ))
    }

    pub fn status(&self, now: DateTime<Utc>) -> Result<String> {
        let threshold = self.settings().orphan_threshold_minutes()?;

        let SessionState::Active(entry) = self.session_state()? else {
            return Ok("No active session".to_string());
        };

        let label = elapsed_label(entry.timestamp, now);
        let mut report = format!(
            "Active session: \"{}\"\nStarted: {}\nDuration: {}\nProject: {}",
            entry.message,
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            label,
            entry.project
        );

        let minutes = elapsed_minutes(entry.timestamp, now);
        if minutes as f64 > threshold {
            report.push_str(&format!(
                "\n\n⚠️  Warning: Session has been active for {} (>{}h threshold)\n\
                 Consider stopping it with: devlog stop \"<what you accomplished>\"",
                label,
                (threshold / 60.0).floor()
            ));
        }
        Ok(report)
    }

    /// Write default settings documents that do not exist yet.
    pub fn init(&self) -> Result<String> {
        let global = self.init_document(
            &self.paths.global_dir,
            &self.paths.global_settings,
            default_global_settings(),
            "global",
        )?;
        let project = self.init_document(
            self.paths.project_settings_dir(),
            &self.paths.project_settings,
            default_project_settings(&self.paths),
            "project",
        )?;
        Ok(format!("{}\n{}", global, project))
    }

    fn init_document(
        &self,
        dir: &Path,
        path: &Path,
        defaults: Settings,
        scope: &str,
    ) -> Result<String> {
        self.fs
            .ensure_dir(dir)
            .map_err(|e| DevlogError::io(dir, e))?;
        if self.fs.exists(path) {
            return Ok(format!(
                "✓ {} settings already exist at {}",
                capitalize(scope),
                path.display()
            ));
        }
        settings::save(self.fs, path, &defaults)?;
        tracing::info!(path = %path.display(), scope, "created settings");
        Ok(format!(
            "✓ Created {} settings at {}",
            scope,
            path.display()
        ))
    }

    /// `config <key>` reads, `config <key> <value>` writes the project document.
    pub fn config(&self, key: &str, value: Option<&str>) -> Result<String> {
        match value {
            Some(raw) => self.settings().set(key, raw),
            None => self.settings().get(key),
        }
    }
}

fn required_message<'m>(message: &'m str, command: &str) -> Result<&'m str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(DevlogError::validation(format!(
            "Message is required for {} command",
            command
        )));
    }
    Ok(trimmed)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn into_settings(value: Value) -> Settings {
    match value {
        Value::Object(map) => map,
        _ => Settings::new(),
    }
}

fn default_global_settings() -> Settings {
    into_settings(json!({
        "orphanedSessionThreshold": 240,
        "defaultProjectName": "untitled",
        "timestampFormat": "iso",
        "colorOutput": true,
    }))
}

fn default_project_settings(paths: &Paths) -> Settings {
    let project_name = paths
        .project_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string());
    into_settings(json!({
        "projectName": project_name,
        "orphanedSessionThreshold": 180,
        "autoCommitSuggestions": false,
        "excludePatterns": ["node_modules", ".git"],
    }))
}
