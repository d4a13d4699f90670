//! Human-readable time handling
//!
//! Track durations arrive from the catalog as display strings (`m:ss`, or
//! `h:mm:ss` for long recordings). These helpers convert between that form and
//! `std::time::Duration`, and render "added N days ago" labels.

use std::time::Duration;

/// Parse a catalog duration string.
///
/// Accepts `m:ss` and `h:mm:ss`. Seconds and minutes after the leading field
/// must be below 60. Returns `None` for anything else, including a leading
/// field too large to count in seconds; catalog data is not trusted to be
/// well-formed.
///
/// # Examples
///
/// ```
/// use hymnal_common::human_time::parse_track_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_track_duration("3:45"), Some(Duration::from_secs(225)));
/// assert_eq!(parse_track_duration("1:02:03"), Some(Duration::from_secs(3723)));
/// assert_eq!(parse_track_duration("3:75"), None);
/// ```
pub fn parse_track_duration(text: &str) -> Option<Duration> {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let fields: Vec<u64> = parts
        .iter()
        .map(|p| {
            if p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()) {
                None
            } else {
                p.parse::<u64>().ok()
            }
        })
        .collect::<Option<Vec<_>>>()?;

    let seconds = match fields.as_slice() {
        [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s)?,
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s)?,
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}

/// Format a duration the way the catalog does (`m:ss`, `h:mm:ss` past an hour)
///
/// # Examples
///
/// ```
/// use hymnal_common::human_time::format_track_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_track_duration(Duration::from_secs(225)), "3:45");
/// assert_eq!(format_track_duration(Duration::from_secs(3723)), "1:02:03");
/// ```
pub fn format_track_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Label for a favorite's age in whole days
pub fn format_days_ago(days: i64) -> String {
    match days {
        d if d <= 0 => "today".to_string(),
        1 => "yesterday".to_string(),
        d => format!("{} days ago", d),
    }
}
