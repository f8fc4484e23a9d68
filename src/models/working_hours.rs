use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::time::{day_index, format_slot};

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkingHours {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// One barber's week, indexed 0 = Sunday .. 6 = Saturday. `None` means closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Option<DayHours>; 7],
}

impl WeeklySchedule {
    pub fn from_rows(rows: &[WorkingHours]) -> Self {
        let mut schedule = Self::default();
        for row in rows {
            if !row.is_active || row.start_time >= row.end_time {
                continue;
            }
            let Ok(index) = usize::try_from(row.day_of_week) else {
                continue;
            };
            if let Some(slot) = schedule.days.get_mut(index) {
                *slot = Some(DayHours {
                    start_time: row.start_time,
                    end_time: row.end_time,
                });
            }
        }
        schedule
    }

    pub fn set(&mut self, day: Weekday, hours: Option<DayHours>) {
        self.days[day_index(day)] = hours;
    }

    pub fn get(&self, day: Weekday) -> Option<&DayHours> {
        self.days[day_index(day)].as_ref()
    }

    pub fn entries(&self) -> Vec<ScheduleEntry> {
        self.days
            .iter()
            .enumerate()
            .map(|(index, hours)| ScheduleEntry {
                day_of_week: index as i16,
                day_name: DAY_NAMES[index].to_string(),
                start_time: hours.map(|h| format_slot(h.start_time)),
                end_time: hours.map(|h| format_slot(h.end_time)),
                is_active: hours.is_some(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub day_of_week: i16,
    pub day_name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: i16, start: (u32, u32), end: (u32, u32), is_active: bool) -> WorkingHours {
        WorkingHours {
            id: Uuid::new_v4(),
            barber_id: Uuid::nil(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            is_active,
        }
    }

    #[test]
    fn table_is_keyed_by_weekday_from_sunday() {
        let schedule = WeeklySchedule::from_rows(&[
            row(0, (10, 0), (14, 0), true),
            row(6, (9, 0), (18, 0), true),
        ]);

        assert_eq!(
            schedule.get(Weekday::Sun).map(|h| h.start_time),
            NaiveTime::from_hms_opt(10, 0, 0)
        );
        assert!(schedule.get(Weekday::Sat).is_some());
        assert!(schedule.get(Weekday::Mon).is_none());
    }

    #[test]
    fn inactive_and_inverted_rows_are_closed() {
        let schedule = WeeklySchedule::from_rows(&[
            row(1, (9, 0), (12, 0), false),
            row(2, (12, 0), (9, 0), true),
            row(9, (9, 0), (12, 0), true),
        ]);

        assert_eq!(schedule, WeeklySchedule::default());
    }

    #[test]
    fn entries_cover_all_seven_days() {
        let schedule = WeeklySchedule::from_rows(&[row(3, (9, 30), (17, 0), true)]);
        let entries = schedule.entries();

        assert_eq!(entries.len(), 7);
        assert_eq!(entries[3].day_name, "Wednesday");
        assert_eq!(entries[3].start_time.as_deref(), Some("09:30"));
        assert!(!entries[4].is_active);
    }
}
