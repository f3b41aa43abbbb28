use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{EntryLog, EntryLogView};

/// `"2h 5m"` / `"45m"`, or `"In campus"` while the visit is still open.
pub fn format_duration(minutes: Option<f64>) -> String {
    let Some(minutes) = minutes else {
        return "In campus".to_string();
    };
    let total = minutes.trunc() as i64;
    let hours = total / 60;
    let remaining = total % 60;
    if hours > 0 {
        format!("{}h {}m", hours, remaining)
    } else {
        format!("{}m", remaining)
    }
}

/// Coarse "time ago" label, falling back to an absolute date in `offset`
/// after a week.
pub fn format_relative_time(
    then: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> String {
    let Some(then) = then else {
        return "Unknown".to_string();
    };
    let elapsed = (now - then).max(chrono::Duration::zero());
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else if days < 7 {
        format!("{} days ago", days)
    } else {
        then.with_timezone(offset).format("%d/%m/%Y %H:%M").to_string()
    }
}

/// Entry/exit line of a record, e.g. `15/01/2024 16:00:05`.
pub fn format_timestamp(at: DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%d/%m/%Y %H:%M:%S").to_string()
}

pub fn entry_log_view(log: EntryLog, now: DateTime<Utc>, offset: &FixedOffset) -> EntryLogView {
    EntryLogView {
        duration_formatted: format_duration(log.duration_minutes),
        time_ago: format_relative_time(log.entry_time, now, offset),
        entry_time_formatted: log.entry_time.map(|t| format_timestamp(t, offset)),
        exit_time_formatted: log.exit_time.map(|t| format_timestamp(t, offset)),
        log,
    }
}
