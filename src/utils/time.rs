use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};

/// Booking granularity in minutes.
pub const SLOT_MINUTES: u32 = 30;

/// 0 = Sunday .. 6 = Saturday, matching the `day_of_week` column.
pub fn day_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

pub fn weekday_from_index(index: i16) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn day_of_week(date: NaiveDate) -> Weekday {
    date.weekday()
}

/// Parses a wall-clock `HH:MM` string. `HH:MM:SS` is accepted and the seconds are kept.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Parses a civil `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn format_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn from_minutes_of_day(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

pub fn is_slot_aligned(time: NaiveTime) -> bool {
    time.second() == 0 && minutes_of_day(time) % SLOT_MINUTES == 0
}
