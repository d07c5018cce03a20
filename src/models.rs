use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Start,
    Stop,
}

/// One line of the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub message: String,
    pub project: String,
}

impl LogEntry {
    pub fn start(message: &str, project: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(EntryKind::Start, message, project, timestamp)
    }

    pub fn stop(message: &str, project: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(EntryKind::Stop, message, project, timestamp)
    }

    fn new(kind: EntryKind, message: &str, project: &str, timestamp: DateTime<Utc>) -> Self {
        LogEntry {
            timestamp,
            kind,
            message: message.to_string(),
            project: project.to_string(),
        }
    }
}

/// Session state for one project, derived by replaying the log.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NoSession,
    Active(LogEntry),
}

impl From<Option<LogEntry>> for SessionState {
    fn from(entry: Option<LogEntry>) -> Self {
        entry.map_or(SessionState::NoSession, SessionState::Active)
    }
}

/// `2025-01-01T09:30:00.000Z` on write, any RFC 3339 instant on read.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_type_key_and_millis() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap();
        let entry = LogEntry::start("Working on auth", "/p", ts);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2025-01-01T09:30:00.000Z","type":"start","message":"Working on auth","project":"/p"}"#
        );
    }

    #[test]
    fn accepts_offset_timestamps() {
        let line = r#"{"timestamp":"2025-01-01T10:30:00+01:00","type":"stop","message":"done","project":"/p"}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.kind, EntryKind::Stop);
        assert_eq!(
            entry.timestamp,
            Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        let line = r#"{"timestamp":"2025-01-01T09:30:00Z","type":"pause","message":"x","project":"/p"}"#;
        assert!(serde_json::from_str::<LogEntry>(line).is_err());
    }

    #[test]
    fn session_state_from_option() {
        assert_eq!(SessionState::from(None), SessionState::NoSession);
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let entry = LogEntry::start("m", "/p", ts);
        assert_eq!(
            SessionState::from(Some(entry.clone())),
            SessionState::Active(entry)
        );
    }
}
