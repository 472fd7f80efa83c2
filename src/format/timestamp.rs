//! Relative message timestamps.
//!
//! The reference time is always passed in; nothing here reads the clock.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone};

/// Render `t` relative to `now`, both as local wall-clock times.
///
/// - same calendar day: `3:07 PM`
/// - previous calendar day: `Yesterday 3:07 PM`
/// - same Sunday-started week as `now`: `Tue 3:07 PM`
/// - anything else: `Jan 5 3:07 PM`
pub fn format_timestamp(t: NaiveDateTime, now: NaiveDateTime) -> String {
    let clock = format_clock(t);
    let day = t.date();
    let today = now.date();

    if day == today {
        return clock;
    }

    if today.pred_opt() == Some(day) {
        return format!("Yesterday {clock}");
    }

    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let week_end = week_start + Duration::days(6);
    if (week_start..=week_end).contains(&day) {
        return format!("{} {clock}", t.format("%a"));
    }

    format!("{} {clock}", t.format("%b %-d"))
}

/// [`format_timestamp`] for zone-aware times, compared in `now`'s zone.
pub fn format_timestamp_in<Tz: TimeZone>(t: &DateTime<Tz>, now: &DateTime<Tz>) -> String {
    let zone = now.timezone();
    format_timestamp(
        t.with_timezone(&zone).naive_local(),
        now.naive_local(),
    )
}

/// Twelve-hour clock time without a leading zero on the hour.
pub fn format_clock(t: NaiveDateTime) -> String {
    t.format("%-I:%M %p").to_string()
}
