use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// This is the standard way of converting a timestamp to a string in workclock. It is used both
/// for the ledger file and for reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
}

/// Formats a duration as `H:MM:SS`. Hours are not wrapped into days.
pub fn format_duration(v: Duration) -> String {
    let total = v.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{sign}{}:{:02}:{:02}",
        total / SECONDS_PER_HOUR,
        total % SECONDS_PER_HOUR / SECONDS_PER_MINUTE,
        total % SECONDS_PER_MINUTE
    )
}

/// An `HH:MM` time of day used for correcting a forgotten punch. It is always applied to the
/// current date, there is no way to reach into previous days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new_opt(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected 24-hour time as HH:MM, got {s:?}"))?;
        let hour = hour.parse::<u32>()?;
        let minute = minute.parse::<u32>()?;
        TimeOfDay::new_opt(hour, minute)
            .ok_or_else(|| anyhow!("{s:?} is not a valid 24-hour time of day"))
    }
}
