use std::path::PathBuf;

use crate::error::{DevlogError, Result};
use crate::fs_ops::FileOps;
use crate::models::{EntryKind, LogEntry};

/// Parse every well-formed entry in file order. Blank and malformed lines are
/// skipped.
pub fn parse_entries(log_text: &str) -> impl Iterator<Item = LogEntry> + '_ {
    log_text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(line = idx + 1, error = %e, "skipping malformed log line");
                None
            }
        })
}

/// The latest `start` for `project_key` that no later `stop` has closed.
pub fn active_session(log_text: Option<&str>, project_key: &str) -> Option<LogEntry> {
    let text = log_text?;
    let mut pending = None;
    for entry in parse_entries(text).filter(|e| e.project == project_key) {
        match entry.kind {
            EntryKind::Start => pending = Some(entry),
            EntryKind::Stop => pending = None,
        }
    }
    pending
}

/// `existing` with `entry` appended as one compact JSON line.
pub fn append(existing: &str, entry: &LogEntry) -> Result<String> {
    let line = serde_json::to_string(entry)?;
    let mut out = String::with_capacity(existing.len() + line.len() + 1);
    out.push_str(existing);
    out.push_str(&line);
    out.push('\n');
    Ok(out)
}

/// The session log on disk.
pub struct Ledger<'a, F: FileOps> {
    fs: &'a F,
    path: PathBuf,
}

impl<'a, F: FileOps> Ledger<'a, F> {
    pub fn new(fs: &'a F, path: impl Into<PathBuf>) -> Self {
        Ledger {
            fs,
            path: path.into(),
        }
    }

    /// Full log text, or `None` if the log has never been written.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }
        self.fs
            .read_text(&self.path)
            .map(Some)
            .map_err(|e| DevlogError::io(&self.path, e))
    }

    pub fn active_session(&self, project_key: &str) -> Result<Option<LogEntry>> {
        let text = self.load()?;
        Ok(active_session(text.as_deref(), project_key))
    }

    /// Append `entry` and write the log back in full. The parent directory
    /// must already exist.
    pub fn record(&self, entry: &LogEntry) -> Result<()> {
        let existing = self.load()?.unwrap_or_default();
        let updated = append(&existing, entry)?;
        self.fs
            .write_text(&self.path, &updated)
            .map_err(|e| DevlogError::io(&self.path, e))?;
        tracing::info!(kind = ?entry.kind, project = %entry.project, "recorded session event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::fs_ops::MemoryFs;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(min)
    }

    fn log_of(entries: &[LogEntry]) -> String {
        entries
            .iter()
            .try_fold(String::new(), |acc, e| append(&acc, e))
            .unwrap()
    }

    #[test]
    fn no_log_means_no_session() {
        assert_eq!(active_session(None, "/p"), None);
        assert_eq!(active_session(Some(""), "/p"), None);
    }

    #[test]
    fn start_alone_is_active() {
        let start = LogEntry::start("auth", "/p", t(0));
        let log = log_of(&[start.clone()]);
        assert_eq!(active_session(Some(&log), "/p"), Some(start));
    }

    #[test]
    fn start_then_stop_is_closed() {
        let log = log_of(&[
            LogEntry::start("auth", "/p", t(0)),
            LogEntry::stop("done", "/p", t(10)),
        ]);
        assert_eq!(active_session(Some(&log), "/p"), None);
    }

    #[test]
    fn later_start_overwrites_earlier() {
        let second = LogEntry::start("second", "/p", t(5));
        let log = log_of(&[LogEntry::start("first", "/p", t(0)), second.clone()]);
        assert_eq!(active_session(Some(&log), "/p"), Some(second));
    }

    #[test]
    fn stop_without_start_is_noop() {
        let start = LogEntry::start("after", "/p", t(5));
        let log = log_of(&[LogEntry::stop("early", "/p", t(0)), start.clone()]);
        assert_eq!(active_session(Some(&log), "/p"), Some(start));
    }

    #[test]
    fn projects_are_isolated() {
        let a = LogEntry::start("a", "/a", t(0));
        let log = log_of(&[
            a.clone(),
            LogEntry::start("b", "/b", t(1)),
            LogEntry::stop("b done", "/b", t(2)),
        ]);
        assert_eq!(active_session(Some(&log), "/a"), Some(a));
        assert_eq!(active_session(Some(&log), "/b"), None);
        assert_eq!(active_session(Some(&log), "/a/"), None);
    }

    #[test]
    fn file_order_wins_over_timestamps() {
        // stop is stamped earlier but written later
        let log = log_of(&[
            LogEntry::start("s", "/p", t(10)),
            LogEntry::stop("x", "/p", t(0)),
        ]);
        assert_eq!(active_session(Some(&log), "/p"), None);
    }

    #[test]
    fn malformed_and_blank_lines_are_skipped() {
        let start = LogEntry::start("auth", "/p", t(0));
        let clean = log_of(&[start.clone()]);
        let dirty = format!(
            "not json\n\n{}{{\"type\":\"stop\"}}\n   \n[1,2]\n{{\"timestamp\":\"bad\",\"type\":\"stop\",\"message\":\"m\",\"project\":\"/p\"}}\n",
            clean
        );
        assert_eq!(active_session(Some(&dirty), "/p"), Some(start));
        assert_eq!(parse_entries(&dirty).count(), 1);
    }

    #[test]
    fn append_writes_compact_lines() {
        let out = append("", &LogEntry::start("m", "/p", t(0))).unwrap();
        assert!(out.ends_with('\n'));
        assert_eq!(out.lines().count(), 1);
        assert!(!out.contains("\n "));
        let out = append(&out, &LogEntry::stop("n", "/p", t(1))).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn ledger_record_and_replay() {
        let fs = MemoryFs::new();
        fs.ensure_dir(Path::new("/home/u/.devlog")).unwrap();
        let ledger = Ledger::new(&fs, "/home/u/.devlog/sessions.jsonl");
        assert_eq!(ledger.load().unwrap(), None);

        let start = LogEntry::start("m", "/p", t(0));
        ledger.record(&start).unwrap();
        assert_eq!(ledger.active_session("/p").unwrap(), Some(start));

        ledger.record(&LogEntry::stop("n", "/p", t(3))).unwrap();
        assert_eq!(ledger.active_session("/p").unwrap(), None);
        assert_eq!(ledger.load().unwrap().unwrap().lines().count(), 2);
    }

    #[test]
    fn ledger_record_without_dir_is_io_error() {
        let fs = MemoryFs::new();
        let ledger = Ledger::new(&fs, "/missing/sessions.jsonl");
        let err = ledger.record(&LogEntry::start("m", "/p", t(0))).unwrap_err();
        assert!(err.is_fatal());
    }
}
