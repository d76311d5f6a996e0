use chrono::{DateTime, FixedOffset};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a session's time span in the start's local offset:
/// "Jan 14 10:00-11:30", or with both dates when it spans midnight
pub fn format_session_range(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> String {
    let end_local = end.with_timezone(start.offset());
    if start.date_naive() == end_local.date_naive() {
        format!("{}-{}", start.format("%b %d %H:%M"), end_local.format("%H:%M"))
    } else {
        format!("{} - {}", start.format("%b %d %H:%M"), end_local.format("%b %d %H:%M"))
    }
}
