//! Local wall-clock timestamps for console output

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current local time as `YYYY-MM-DDTHH:MM:SS`
pub fn local_timestamp() -> String {
    format_timestamp(&Local::now())
}

fn format_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}
