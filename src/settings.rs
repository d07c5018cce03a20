use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{DevlogError, Result};
use crate::fs_ops::FileOps;
use crate::paths::Paths;

pub type Settings = Map<String, Value>;

pub const ORPHANED_SESSION_THRESHOLD: &str = "orphanedSessionThreshold";
pub const DEFAULT_ORPHAN_THRESHOLD_MINUTES: f64 = 240.0;

fn read_raw<F: FileOps>(fs: &F, path: &Path) -> Result<Option<String>> {
    if !fs.exists(path) {
        return Ok(None);
    }
    fs.read_text(path)
        .map(Some)
        .map_err(|e| DevlogError::io(path, e))
}

/// A settings document, or an empty one if it is missing or not valid JSON.
pub fn load<F: FileOps>(fs: &F, path: &Path) -> Result<Settings> {
    let Some(content) = read_raw(fs, path)? else {
        return Ok(Settings::new());
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Settings::new()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt settings file");
            Ok(Settings::new())
        }
    }
}

/// `<key>: <json>` for a key stored in the document at `path`.
pub fn get<F: FileOps>(fs: &F, path: &Path, key: &str) -> Result<String> {
    let not_found = || DevlogError::SettingNotFound {
        key: key.to_string(),
    };
    let content = read_raw(fs, path)?.ok_or_else(not_found)?;
    let doc: Value =
        serde_json::from_str(&content).map_err(|source| DevlogError::SettingsUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let value = doc.get(key).ok_or_else(not_found)?;
    Ok(format!("{}: {}", key, serde_json::to_string(value)?))
}

/// Coerce `raw`, store it under `key` and rewrite the whole document.
pub fn set<F: FileOps>(
    fs: &F,
    path: &Path,
    key: &str,
    raw: &str,
    is_project: bool,
) -> Result<String> {
    if let Some(parent) = path.parent() {
        fs.ensure_dir(parent)
            .map_err(|e| DevlogError::io(parent, e))?;
    }
    let mut settings = load(fs, path)?;
    let value = coerce_value(raw);
    let encoded = serde_json::to_string(&value)?;
    settings.insert(key.to_string(), value);
    save(fs, path, &settings)?;

    let scope = if is_project { "project" } else { "global" };
    Ok(format!("Set {} setting {}: {}", scope, key, encoded))
}

/// Write a document as 2-space indented JSON.
pub fn save<F: FileOps>(fs: &F, path: &Path, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    fs.write_text(path, &json)
        .map_err(|e| DevlogError::io(path, e))
}

/// Turn a command-line string into a JSON value.
///
/// Order matters: the literals `true`, `false` and `null`, then anything that
/// reads as a number, then JSON arrays/objects, then the plain string. A
/// numeric-looking value can never be stored as a string.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Some(n) = parse_number(raw) {
        return number_value(n);
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            return parsed;
        }
    }
    Value::String(raw.to_string())
}

fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 {
        // f64 Display gives the shortest round-trip digits without an
        // exponent, so 1.2345678901234567e19 becomes 12345678901234567000
        let digits = n.to_string();
        if let Ok(i) = digits.parse::<i64>() {
            return Value::from(i);
        }
        if let Ok(u) = digits.parse::<u64>() {
            return Value::from(u);
        }
    }
    // NaN and infinities have no JSON form and become null
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Numeric conversion with the leniency of a JavaScript `Number()` call:
/// whitespace is trimmed, the empty string is zero, hex/octal/binary integer
/// literals and `Infinity` are accepted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }
    if is_decimal_literal(s) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
}

/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Project-over-global lookup and project-only writes.
pub struct SettingsResolver<'a, F: FileOps> {
    fs: &'a F,
    paths: &'a Paths,
}

impl<'a, F: FileOps> SettingsResolver<'a, F> {
    pub fn new(fs: &'a F, paths: &'a Paths) -> Self {
        SettingsResolver { fs, paths }
    }

    /// Read from the project document if there is one, otherwise global.
    pub fn get(&self, key: &str) -> Result<String> {
        let path = if self.fs.exists(&self.paths.project_settings) {
            &self.paths.project_settings
        } else {
            &self.paths.global_settings
        };
        get(self.fs, path, key)
    }

    /// Always writes the project document.
    pub fn set(&self, key: &str, raw: &str) -> Result<String> {
        set(self.fs, &self.paths.project_settings, key, raw, true)
    }

    pub fn global(&self) -> Result<Settings> {
        load(self.fs, &self.paths.global_settings)
    }

    /// Minutes after which an open session is reported as orphaned. Only the
    /// global document is consulted.
    pub fn orphan_threshold_minutes(&self) -> Result<f64> {
        let global = self.global()?;
        let threshold = match global.get(ORPHANED_SESSION_THRESHOLD) {
            Some(Value::Number(n)) => n.as_f64().filter(|m| *m != 0.0),
            // hand-edited "300" counts as 300; "" is treated as unset
            Some(Value::String(s)) if !s.is_empty() => parse_number(s),
            _ => None,
        };
        Ok(threshold.unwrap_or(DEFAULT_ORPHAN_THRESHOLD_MINUTES))
    }
}
