use chrono::DateTime;

/// Clamp a metric into the `[0, 1]` band.
///
/// Every engagement/confidence write goes through this so the stored value
/// can never leave the band regardless of how many nudges accumulate.
pub fn clip01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Whitespace token count, used by the follow-up and short-reply detectors.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Render an epoch-seconds timestamp as a human-readable UTC string.
pub fn ts_human(ts: f64) -> String {
    let secs = ts.trunc() as i64;
    let nanos = ((ts - ts.trunc()) * 1_000_000_000.0) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{:.3}", ts),
    }
}

/// Truncate a string to at most `limit` characters (not bytes), appending an
/// ellipsis when anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}…", cut)
}

/// First `limit` characters of a string without the ellipsis marker.
pub fn head_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
