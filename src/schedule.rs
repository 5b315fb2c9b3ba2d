//! Wall-clock scheduling for the daily scrape and snapshot jobs.
//!
//! Deliberately small: parse `HH:MM`, compute the next occurrence, sleep.
//! The pipeline itself knows nothing about schedules; it is invoked from
//! here (or once, directly) by `main`.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, TimeZone};
use std::time::Duration;

/// Parse a `HH:MM` clock time. Returns `None` for anything else.
#[must_use]
pub fn parse_hhmm(raw: &str) -> Option<(u32, u32)> {
    let (hour, minute) = raw.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Time remaining from `now` until the next occurrence of `hour:minute`.
/// If that moment has already passed today, the next occurrence is tomorrow.
#[must_use]
pub fn duration_until(now: DateTime<Local>, hour: u32, minute: u32) -> Duration {
    let target_time = NaiveTime::from_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is valid"));
    let mut target = now.date_naive().and_time(target_time);
    if target <= now.naive_local() {
        target += ChronoDuration::days(1);
    }
    match Local.from_local_datetime(&target).earliest() {
        Some(resolved) => (resolved - now)
            .to_std()
            .unwrap_or(Duration::from_secs(24 * 3600)),
        // DST gap: fall back to a plain day.
        None => Duration::from_secs(24 * 3600),
    }
}

/// Sleep until the next daily occurrence of `hour:minute`.
pub async fn wait_until(hour: u32, minute: u32) {
    tokio::time::sleep(duration_until(Local::now(), hour, minute)).await;
}
