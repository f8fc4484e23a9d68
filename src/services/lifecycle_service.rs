use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::{Error, Result};
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};
use crate::models::message::{Message, MessageDraft, SenderType};
use crate::models::service::DEFAULT_DURATION_MINUTES;
use crate::services::appointment_service::AppointmentStore;
use crate::services::barber_service::BookingCatalog;
use crate::services::calendar_service::{CalendarAdapter, CalendarEvent};
use crate::services::slot_service::SlotService;
use crate::utils::time::truncate_to_minute;

pub const DEFAULT_REQUEST_NOTE: &str = "Appointment request sent";
pub const DEFAULT_CANCEL_REASON: &str = "unspecified";

/// Who is calling: an authenticated barber, or someone without a token acting as the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Barber { barber_id: Uuid, name: String },
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorRole {
    OwningBarber { name: String },
    ForeignBarber,
    Client,
}

pub fn resolve_role(actor: &Actor, appointment: &Appointment) -> ActorRole {
    match actor {
        Actor::Barber { barber_id, name } if *barber_id == appointment.barber_id => {
            ActorRole::OwningBarber { name: name.clone() }
        }
        Actor::Barber { .. } => ActorRole::ForeignBarber,
        Actor::Anonymous => ActorRole::Client,
    }
}

/// Result of a best-effort calendar call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced(String),
    Skipped(String),
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub barber_id: Uuid,
    pub service_id: Option<Uuid>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub appointment: Appointment,
    /// `None` when the transition has no calendar side effect.
    pub calendar: Option<SyncOutcome>,
}

#[derive(Debug, Clone)]
pub struct AppointmentThread {
    pub appointment: Appointment,
    pub messages: Vec<Message>,
}

#[derive(Clone)]
pub struct LifecycleService {
    appointments: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn BookingCatalog>,
    calendar: Arc<dyn CalendarAdapter>,
    slots: SlotService,
}

impl LifecycleService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        catalog: Arc<dyn BookingCatalog>,
        calendar: Arc<dyn CalendarAdapter>,
        slots: SlotService,
    ) -> Self {
        Self {
            appointments,
            catalog,
            calendar,
            slots,
        }
    }

    pub async fn request(&self, request: BookingRequest) -> Result<Appointment> {
        if !self.catalog.barber_exists(request.barber_id).await? {
            return Err(Error::NotFound("Barber not found".to_string()));
        }

        let duration_minutes = match request.service_id {
            Some(service_id) => {
                self.catalog
                    .find_service(request.barber_id, service_id)
                    .await?
                    .ok_or_else(|| Error::NotFound("Service not found".to_string()))?
                    .duration_minutes
            }
            None => DEFAULT_DURATION_MINUTES,
        };

        let time = truncate_to_minute(request.appointment_time);
        if !self
            .slots
            .is_available(request.barber_id, request.appointment_date, time)
            .await?
        {
            return Err(Error::slot_unavailable());
        }

        let note = request
            .notes
            .clone()
            .unwrap_or_else(|| DEFAULT_REQUEST_NOTE.to_string());
        let draft = MessageDraft::new(SenderType::Client, request.client_name.clone(), note);

        let appointment = self
            .appointments
            .create_with_message(
                NewAppointment {
                    barber_id: request.barber_id,
                    service_id: request.service_id,
                    client_name: request.client_name,
                    client_phone: request.client_phone,
                    client_email: request.client_email,
                    appointment_date: request.appointment_date,
                    appointment_time: time,
                    duration_minutes,
                    notes: request.notes,
                },
                draft,
            )
            .await?;

        info!(
            appointment_id = %appointment.id,
            barber_id = %appointment.barber_id,
            date = %appointment.appointment_date,
            time = %appointment.appointment_time,
            "appointment requested"
        );
        Ok(appointment)
    }

    pub async fn confirm(&self, id: Uuid, actor: &Actor) -> Result<TransitionResult> {
        let appointment = self.load(id).await?;
        let name = require_owner(actor, &appointment)?;

        let mut confirmed = self
            .apply(
                &appointment,
                AppointmentStatus::Confirmed,
                MessageDraft::new(SenderType::Barber, name, "Appointment confirmed"),
            )
            .await?;

        let outcome = self.push_to_calendar(&confirmed).await;
        if let SyncOutcome::Synced(event_id) = &outcome {
            match self.appointments.set_external_event_id(id, event_id).await {
                Ok(()) => confirmed.external_calendar_event_id = Some(event_id.clone()),
                Err(e) => warn!(appointment_id = %id, error = %e, "failed to store calendar event id"),
            }
        }

        info!(appointment_id = %id, synced = outcome.is_synced(), "appointment confirmed");
        Ok(TransitionResult {
            appointment: confirmed,
            calendar: Some(outcome),
        })
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<TransitionResult> {
        let appointment = self.load(id).await?;
        let (sender_type, sender_name) = match resolve_role(actor, &appointment) {
            ActorRole::OwningBarber { name } => (SenderType::Barber, name),
            ActorRole::Client => (SenderType::Client, appointment.client_name.clone()),
            ActorRole::ForeignBarber => {
                return Err(Error::Forbidden(
                    "Appointment belongs to another barber".to_string(),
                ))
            }
        };

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
        let body = format!("Appointment cancelled. Reason: {}", reason);

        let cancelled = self
            .apply(
                &appointment,
                AppointmentStatus::Cancelled,
                MessageDraft::new(sender_type, sender_name, body),
            )
            .await?;

        let calendar = match cancelled.external_calendar_event_id.as_deref() {
            Some(event_id) => Some(self.remove_from_calendar(&cancelled, event_id).await),
            None => None,
        };

        info!(appointment_id = %id, by = sender_type.as_str(), "appointment cancelled");
        Ok(TransitionResult {
            appointment: cancelled,
            calendar,
        })
    }

    pub async fn complete(&self, id: Uuid, actor: &Actor) -> Result<TransitionResult> {
        let appointment = self.load(id).await?;
        let name = require_owner(actor, &appointment)?;

        let completed = self
            .apply(
                &appointment,
                AppointmentStatus::Completed,
                MessageDraft::new(SenderType::Barber, name, "Appointment completed"),
            )
            .await?;

        info!(appointment_id = %id, "appointment completed");
        Ok(TransitionResult {
            appointment: completed,
            calendar: None,
        })
    }

    /// Appends to the thread whatever the status. Only the owning barber writes as `barber`.
    pub async fn send_message(&self, id: Uuid, actor: &Actor, body: &str) -> Result<Message> {
        let body = body.trim();
        if body.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.add("message", ValidationError::new("length"));
            return Err(errors.into());
        }

        let appointment = self.load(id).await?;
        let draft = match resolve_role(actor, &appointment) {
            ActorRole::OwningBarber { name } => MessageDraft::new(SenderType::Barber, name, body),
            ActorRole::ForeignBarber | ActorRole::Client => {
                MessageDraft::new(SenderType::Client, appointment.client_name.clone(), body)
            }
        };

        self.appointments.append_message(id, draft).await
    }

    pub async fn view(&self, id: Uuid) -> Result<AppointmentThread> {
        let appointment = self.load(id).await?;
        let messages = self.appointments.messages(id).await?;
        Ok(AppointmentThread {
            appointment,
            messages,
        })
    }

    async fn load(&self, id: Uuid) -> Result<Appointment> {
        self.appointments
            .find(id)
            .await?
            .ok_or_else(|| Error::NotFound("Appointment not found".to_string()))
    }

    /// Conditional move to `to`. Loses cleanly to a concurrent transition.
    async fn apply(
        &self,
        appointment: &Appointment,
        to: AppointmentStatus,
        message: MessageDraft,
    ) -> Result<Appointment> {
        let invalid = || match appointment.status() {
            Some(current) if current.is_terminal() => {
                Error::InvalidState(format!("Appointment is already {}", current))
            }
            _ => Error::InvalidState(format!(
                "Cannot move appointment from {} to {}",
                appointment.status, to
            )),
        };

        if !appointment.status().is_some_and(|s| s.can_transition_to(to)) {
            return Err(invalid());
        }

        self.appointments
            .transition(appointment.id, to.allowed_sources(), to, message)
            .await?
            .ok_or_else(invalid)
    }

    async fn push_to_calendar(&self, appointment: &Appointment) -> SyncOutcome {
        let service_name = match appointment.service_id {
            Some(service_id) => self
                .catalog
                .find_service(appointment.barber_id, service_id)
                .await
                .ok()
                .flatten()
                .map(|s| s.name),
            None => None,
        };
        let event = CalendarEvent::from_appointment(appointment, service_name);

        match self
            .calendar
            .push_confirmed_event(appointment.barber_id, &event)
            .await
        {
            Ok(event_id) => SyncOutcome::Synced(event_id),
            Err(e) => {
                warn!(appointment_id = %appointment.id, error = %e, "calendar sync skipped");
                SyncOutcome::Skipped(e.to_string())
            }
        }
    }

    async fn remove_from_calendar(&self, appointment: &Appointment, event_id: &str) -> SyncOutcome {
        match self
            .calendar
            .delete_event(appointment.barber_id, event_id)
            .await
        {
            Ok(()) => SyncOutcome::Synced(event_id.to_string()),
            Err(e) => {
                warn!(appointment_id = %appointment.id, %event_id, error = %e, "calendar delete skipped");
                SyncOutcome::Skipped(e.to_string())
            }
        }
    }
}

fn require_owner(actor: &Actor, appointment: &Appointment) -> Result<String> {
    match resolve_role(actor, appointment) {
        ActorRole::OwningBarber { name } => Ok(name),
        ActorRole::ForeignBarber => Err(Error::Forbidden(
            "Appointment belongs to another barber".to_string(),
        )),
        ActorRole::Client => Err(Error::Unauthorized(
            "Barber authentication required".to_string(),
        )),
    }
}
