/// Utility functions and helpers
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Generate a unique ID based on timestamp and random component
pub fn generate_id(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let random: u64 = rand::random();
    format!("{}-{}-{:016x}", prefix, timestamp, random)
}

/// Fresh lock ownership token, unique per call
pub fn generate_token() -> String {
    generate_id("lock")
}

/// Format duration for human-readable output
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
