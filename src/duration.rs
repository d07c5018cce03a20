use chrono::{DateTime, Utc};

/// Whole minutes from `start` to `now`, floored. Negative when `start` is in
/// the future.
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_milliseconds().div_euclid(60_000)
}

/// `"45m"` under an hour, `"2h 5m"` from an hour up.
pub fn elapsed_label(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = elapsed_minutes(start, now);
    let hours = minutes.div_euclid(60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes.rem_euclid(60))
    } else {
        format!("{}m", minutes)
    }
}
