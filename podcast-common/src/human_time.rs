//! Human-readable time formatting for player controls
//!
//! Two display forms are used by the UI:
//! - Playhead/clock strings (`M:SS`, or `H:MM:SS` once an hour is reached)
//! - Coarse episode lengths (`Ymin`, or `Xh Ymin`)

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;

/// Format a millisecond offset as a playhead string.
///
/// Sub-second remainders are truncated, never rounded up, so a playhead
/// never displays a second it has not reached yet.
///
/// # Examples
///
/// ```
/// use podcast_common::human_time::format_time;
///
/// assert_eq!(format_time(0), "0:00");
/// assert_eq!(format_time(65_000), "1:05");
/// assert_eq!(format_time(59_999), "0:59");
/// assert_eq!(format_time(3_661_000), "1:01:01");
/// ```
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / SECS_PER_HOUR;
    let mins = (total_secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = total_secs % SECS_PER_MINUTE;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format a length in seconds as a coarse duration label.
///
/// # Examples
///
/// ```
/// use podcast_common::human_time::format_duration;
///
/// assert_eq!(format_duration(59), "0min");
/// assert_eq!(format_duration(45 * 60), "45min");
/// assert_eq!(format_duration(2 * 3600 + 5 * 60), "2h 5min");
/// ```
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / SECS_PER_HOUR;
    let mins = (seconds % SECS_PER_HOUR) / SECS_PER_MINUTE;

    if hours > 0 {
        format!("{}h {}min", hours, mins)
    } else {
        format!("{}min", mins)
    }
}
