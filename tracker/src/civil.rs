//! Civil-time helpers pinned to Asia/Tokyo.
//!
//! Japan has not observed daylight saving time since 1951, so a fixed
//! UTC+9 offset is exact for every date the feed can contain.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

const TOKYO_OFFSET_SECS: i32 = 9 * 3600;

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub fn tokyo() -> FixedOffset {
    FixedOffset::east_opt(TOKYO_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

pub fn to_tokyo(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&tokyo())
}

/// Midnight in Tokyo at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(midnight - Duration::seconds(TOKYO_OFFSET_SECS.into())))
}

/// Projection origin for a dataset whose newest day is `last_day`.
///
/// The feed lags by roughly a day, so "today's" accrual is modelled as
/// happening during the day after `last_day`.
pub fn epoch_start(last_day: NaiveDate) -> DateTime<Utc> {
    start_of_day(last_day + Duration::days(1))
}

/// Fractional days elapsed from `origin` to `now`. Negative if `now` is earlier.
pub fn elapsed_days(origin: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - origin).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// The first full Tokyo hour strictly after `now`.
pub fn next_hour_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let local = to_tokyo(now);
    let truncated = local
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    (truncated + Duration::hours(1)).with_timezone(&Utc)
}
