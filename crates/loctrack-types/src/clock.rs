//! Wall-clock helpers for capture timestamps and day boundaries.

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};

/// Pattern used for `formatted_time`, e.g. `07-Mar-2025 14:03:09`.
pub const DISPLAY_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a millisecond timestamp in the local time zone.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    format_timestamp_in(timestamp_ms, &Local)
}

/// Render a millisecond timestamp in the given time zone.
///
/// Out-of-range timestamps render as an empty string.
///
/// ```
/// use chrono::Utc;
/// use loctrack_types::clock::format_timestamp_in;
///
/// assert_eq!(format_timestamp_in(0, &Utc), "01-Jan-1970 00:00:00");
/// ```
pub fn format_timestamp_in<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Milliseconds timestamp of the most recent local midnight.
pub fn start_of_today() -> i64 {
    start_of_day(&Local::now())
}

/// Milliseconds timestamp of midnight on the calendar day of `now`, in
/// `now`'s own time zone.
///
/// When midnight does not exist (a DST gap), the day starts at the first
/// instant after the gap.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let hour = TimeDelta::hours(1);

    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            // An hour before midnight is still on the old offset; one hour
            // later in absolute time is where the gap ends.
            let before = midnight.checked_sub_signed(hour)?;
            tz.from_local_datetime(&before)
                .latest()?
                .checked_add_signed(hour)
        })
        .map_or_else(|| now.timestamp_millis(), |dt| dt.timestamp_millis())
}
