use chrono::{NaiveDate, NaiveTime};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::working_hours::DayHours;
use crate::services::appointment_service::AppointmentStore;
use crate::services::working_hours_service::WorkingHoursStore;
use crate::utils::time::{
    day_of_week, from_minutes_of_day, is_slot_aligned, minutes_of_day, truncate_to_minute,
    SLOT_MINUTES,
};

/// Every grid start inside `[start, end)`: the first multiple of the slot length at or
/// after `start`, then every slot length while the start stays before `end`.
pub fn slot_grid(hours: &DayHours) -> Vec<NaiveTime> {
    let start = minutes_of_day(truncate_to_minute(hours.start_time));
    let end = minutes_of_day(truncate_to_minute(hours.end_time));
    let first = start.div_ceil(SLOT_MINUTES) * SLOT_MINUTES;

    (first..end)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(from_minutes_of_day)
        .collect()
}

/// Grid starts not held by a live appointment. A booking only takes the slot it starts in.
pub fn open_slots(hours: &DayHours, booked: &HashSet<NaiveTime>) -> Vec<NaiveTime> {
    slot_grid(hours)
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect()
}

#[derive(Clone)]
pub struct SlotService {
    hours: Arc<dyn WorkingHoursStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl SlotService {
    pub fn new(hours: Arc<dyn WorkingHoursStore>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { hours, appointments }
    }

    /// Ascending free start times for `barber_id` on `date`. Closed days yield nothing.
    pub async fn available_slots(&self, barber_id: Uuid, date: NaiveDate) -> Result<Vec<NaiveTime>> {
        let Some(hours) = self.hours.day_hours(barber_id, day_of_week(date)).await? else {
            return Ok(Vec::new());
        };

        let booked = self.appointments.booked_times(barber_id, date).await?;
        Ok(open_slots(&hours, &booked))
    }

    pub async fn is_available(&self, barber_id: Uuid, date: NaiveDate, time: NaiveTime) -> Result<bool> {
        let time = truncate_to_minute(time);
        if !is_slot_aligned(time) {
            return Ok(false);
        }
        Ok(self.available_slots(barber_id, date).await?.contains(&time))
    }
}
