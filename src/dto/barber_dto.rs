use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::appointment_dto::AppointmentResponse;
use crate::error::Result;
use crate::models::appointment::StatusCounts;
use crate::models::barber::BarberProfile;
use crate::models::service::ShopService;
use crate::models::working_hours::{DayHours, ScheduleEntry};
use crate::services::working_hours_service::ScheduleChange;
use crate::utils::time::{parse_clock, weekday_from_index};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BarberSearchQuery {
    pub neighborhood: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicBarberResponse {
    pub barber: BarberProfile,
    pub services: Vec<ShopService>,
    /// Open days only.
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1))]
    pub shop_name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    #[validate(length(min = 1))]
    pub neighborhood: Option<String>,
    #[validate(length(min = 1))]
    pub city: Option<String>,
    pub description: Option<String>,
    pub hourly_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateServicePayload {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateServicePayload {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntryPayload {
    pub day_of_week: i16,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSchedulePayload {
    pub days: Vec<ScheduleEntryPayload>,
}

impl UpdateSchedulePayload {
    /// Every entry is checked before anything is written; one bad day rejects the lot.
    pub fn into_changes(self) -> Result<Vec<ScheduleChange>> {
        let mut errors = ValidationErrors::new();
        let mut changes = Vec::with_capacity(self.days.len());

        for entry in self.days {
            let Some(day) = weekday_from_index(entry.day_of_week) else {
                errors.add("day_of_week", ValidationError::new("range"));
                continue;
            };
            if !entry.is_active {
                changes.push(ScheduleChange { day, hours: None });
                continue;
            }

            let start = entry.start_time.as_deref().and_then(parse_clock);
            let end = entry.end_time.as_deref().and_then(parse_clock);
            match (start, end) {
                (Some(start_time), Some(end_time)) if start_time < end_time => {
                    changes.push(ScheduleChange {
                        day,
                        hours: Some(DayHours {
                            start_time,
                            end_time,
                        }),
                    });
                }
                (Some(_), Some(_)) => errors.add("end_time", ValidationError::new("after_start")),
                (None, _) => errors.add("start_time", ValidationError::new("required")),
                (_, None) => errors.add("end_time", ValidationError::new("required")),
            }
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors.into())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub days: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub barber: BarberProfile,
    pub stats: StatusCounts,
    pub recent_appointments: Vec<AppointmentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::Weekday;

    fn entry(day: i16, start: Option<&str>, end: Option<&str>, is_active: bool) -> ScheduleEntryPayload {
        ScheduleEntryPayload {
            day_of_week: day,
            start_time: start.map(String::from),
            end_time: end.map(String::from),
            is_active,
        }
    }

    #[test]
    fn active_and_closed_days_become_changes() {
        let changes = UpdateSchedulePayload {
            days: vec![
                entry(1, Some("09:00"), Some("18:00"), true),
                entry(0, None, None, false),
            ],
        }
        .into_changes()
        .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].day, Weekday::Mon);
        assert!(changes[0].hours.is_some());
        assert_eq!(changes[1], ScheduleChange { day: Weekday::Sun, hours: None });
    }

    #[test]
    fn bad_days_and_inverted_hours_are_rejected() {
        for days in [
            vec![entry(7, Some("09:00"), Some("18:00"), true)],
            vec![entry(2, Some("18:00"), Some("09:00"), true)],
            vec![entry(2, Some("09:00"), None, true)],
            vec![entry(-1, None, None, false)],
        ] {
            let result = UpdateSchedulePayload { days }.into_changes();
            assert!(matches!(result, Err(Error::Validation(_))));
        }
    }
}
