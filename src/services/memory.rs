//! In-process booking backend for tests and local runs without Postgres. Holds everything
//! behind one mutex so each store call is atomic, and enforces the same
//! one-live-appointment-per-slot rule as the database index. Production wiring in
//! `AppState::new` always uses the Postgres stores.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};
use crate::models::message::{Message, MessageDraft};
use crate::models::service::ShopService;
use crate::models::working_hours::WeeklySchedule;
use crate::services::appointment_service::AppointmentStore;
use crate::services::barber_service::BookingCatalog;
use crate::services::working_hours_service::WorkingHoursStore;
use crate::utils::time::truncate_to_minute;

#[derive(Default)]
struct Tables {
    barbers: HashMap<Uuid, String>,
    services: HashMap<Uuid, ShopService>,
    schedules: HashMap<Uuid, WeeklySchedule>,
    appointments: HashMap<Uuid, Appointment>,
    messages: Vec<Message>,
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_barber(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables().barbers.insert(id, name.to_string());
        id
    }

    pub fn add_service(&self, barber_id: Uuid, name: &str, duration_minutes: i32) -> Uuid {
        let now = Utc::now();
        let service = ShopService {
            id: Uuid::new_v4(),
            barber_id,
            name: name.to_string(),
            description: None,
            price: Decimal::new(1500, 2),
            duration_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let id = service.id;
        self.tables().services.insert(id, service);
        id
    }

    pub fn set_hours(&self, barber_id: Uuid, schedule: WeeklySchedule) {
        self.tables().schedules.insert(barber_id, schedule);
    }

    pub fn appointment_count(&self) -> usize {
        self.tables().appointments.len()
    }

    pub fn message_count(&self) -> usize {
        self.tables().messages.len()
    }
}

fn message_row(appointment_id: Uuid, draft: MessageDraft) -> Message {
    Message {
        id: Uuid::new_v4(),
        appointment_id,
        sender_type: draft.sender_type.as_str().to_string(),
        sender_name: draft.sender_name,
        body: draft.body,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl WorkingHoursStore for MemoryBackend {
    async fn weekly_schedule(&self, barber_id: Uuid) -> Result<WeeklySchedule> {
        Ok(self
            .tables()
            .schedules
            .get(&barber_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl BookingCatalog for MemoryBackend {
    async fn barber_exists(&self, barber_id: Uuid) -> Result<bool> {
        Ok(self.tables().barbers.contains_key(&barber_id))
    }

    async fn find_service(&self, barber_id: Uuid, service_id: Uuid) -> Result<Option<ShopService>> {
        Ok(self
            .tables()
            .services
            .get(&service_id)
            .filter(|s| s.barber_id == barber_id && s.is_active)
            .cloned())
    }
}

#[async_trait]
impl AppointmentStore for MemoryBackend {
    async fn find(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.tables().appointments.get(&id).cloned())
    }

    async fn booked_times(&self, barber_id: Uuid, date: NaiveDate) -> Result<HashSet<NaiveTime>> {
        Ok(self
            .tables()
            .appointments
            .values()
            .filter(|a| {
                a.barber_id == barber_id
                    && a.appointment_date == date
                    && a.status() != Some(AppointmentStatus::Cancelled)
            })
            .map(|a| truncate_to_minute(a.appointment_time))
            .collect())
    }

    async fn create_with_message(
        &self,
        appointment: NewAppointment,
        message: MessageDraft,
    ) -> Result<Appointment> {
        let mut tables = self.tables();
        let time = truncate_to_minute(appointment.appointment_time);

        let taken = tables.appointments.values().any(|a| {
            a.barber_id == appointment.barber_id
                && a.appointment_date == appointment.appointment_date
                && truncate_to_minute(a.appointment_time) == time
                && a.status() != Some(AppointmentStatus::Cancelled)
        });
        if taken {
            return Err(Error::slot_unavailable());
        }

        let now = Utc::now();
        let created = Appointment {
            id: Uuid::new_v4(),
            barber_id: appointment.barber_id,
            service_id: appointment.service_id,
            client_name: appointment.client_name,
            client_phone: appointment.client_phone,
            client_email: appointment.client_email,
            appointment_date: appointment.appointment_date,
            appointment_time: time,
            duration_minutes: appointment.duration_minutes,
            status: AppointmentStatus::Pending.as_str().to_string(),
            notes: appointment.notes,
            external_calendar_event_id: None,
            created_at: now,
            updated_at: now,
        };

        tables.appointments.insert(created.id, created.clone());
        tables.messages.push(message_row(created.id, message));
        Ok(created)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
        message: MessageDraft,
    ) -> Result<Option<Appointment>> {
        let mut tables = self.tables();
        let Some(appointment) = tables.appointments.get_mut(&id) else {
            return Ok(None);
        };
        if !appointment.status().is_some_and(|s| from.contains(&s)) {
            return Ok(None);
        }

        appointment.status = to.as_str().to_string();
        appointment.updated_at = Utc::now();
        let updated = appointment.clone();

        tables.messages.push(message_row(id, message));
        Ok(Some(updated))
    }

    async fn set_external_event_id(&self, id: Uuid, event_id: &str) -> Result<()> {
        if let Some(appointment) = self.tables().appointments.get_mut(&id) {
            appointment.external_calendar_event_id = Some(event_id.to_string());
            appointment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn append_message(&self, appointment_id: Uuid, message: MessageDraft) -> Result<Message> {
        let mut tables = self.tables();
        if !tables.appointments.contains_key(&appointment_id) {
            return Err(Error::NotFound("Appointment not found".to_string()));
        }
        let row = message_row(appointment_id, message);
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn messages(&self, appointment_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .tables()
            .messages
            .iter()
            .filter(|m| m.appointment_id == appointment_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::SenderType;
    use crate::utils::time::parse_clock;

    fn booking(barber_id: Uuid, time: &str) -> NewAppointment {
        NewAppointment {
            barber_id,
            service_id: None,
            client_name: "Ana".into(),
            client_phone: "555-0101".into(),
            client_email: None,
            appointment_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            appointment_time: parse_clock(time).unwrap(),
            duration_minutes: 30,
            notes: None,
        }
    }

    fn draft(body: &str) -> MessageDraft {
        MessageDraft::new(SenderType::Client, "Ana", body)
    }

    #[tokio::test]
    async fn second_live_insert_on_a_slot_is_a_conflict() {
        let backend = MemoryBackend::default();
        let barber_id = backend.add_barber("Marco");

        backend
            .create_with_message(booking(barber_id, "10:00"), draft("first"))
            .await
            .unwrap();
        let err = backend
            .create_with_message(booking(barber_id, "10:00:45"), draft("second"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(backend.appointment_count(), 1);
        assert_eq!(backend.message_count(), 1);

        let other_barber = backend.add_barber("Luis");
        backend
            .create_with_message(booking(other_barber, "10:00"), draft("elsewhere"))
            .await
            .unwrap();
        assert_eq!(backend.appointment_count(), 2);
    }

    #[tokio::test]
    async fn cancelled_appointment_releases_its_slot() {
        let backend = MemoryBackend::default();
        let barber_id = backend.add_barber("Marco");

        let first = backend
            .create_with_message(booking(barber_id, "10:00"), draft("first"))
            .await
            .unwrap();
        backend
            .transition(
                first.id,
                AppointmentStatus::Cancelled.allowed_sources(),
                AppointmentStatus::Cancelled,
                draft("cancelled"),
            )
            .await
            .unwrap();

        backend
            .create_with_message(booking(barber_id, "10:00"), draft("again"))
            .await
            .unwrap();
        assert_eq!(backend.appointment_count(), 2);
        assert_eq!(backend.message_count(), 3);
    }
}
