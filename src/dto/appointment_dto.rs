use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Error, Result};
use crate::models::appointment::Appointment;
use crate::models::message::Message;
use crate::services::lifecycle_service::{BookingRequest, SyncOutcome};
use crate::utils::time::{format_slot, parse_clock, parse_date};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SlotQuery {
    pub barber_id: Option<String>,
    pub date: Option<String>,
}

impl SlotQuery {
    /// Blank parameters count as missing.
    pub fn parse(&self) -> Result<(Uuid, NaiveDate)> {
        let barber_id = present(&self.barber_id).and_then(|raw| Uuid::parse_str(raw).ok());
        let date = present(&self.date).and_then(parse_date);
        match (barber_id, date) {
            (Some(barber_id), Some(date)) => Ok((barber_id, date)),
            _ => Err(Error::BadRequest(
                "barber_id (UUID) and date (YYYY-MM-DD) are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub barber_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestAppointmentPayload {
    #[validate(required)]
    pub barber_id: Option<String>,
    pub service_id: Option<Uuid>,
    #[validate(required, length(max = 255))]
    pub client_name: Option<String>,
    #[validate(required, length(max = 50))]
    pub client_phone: Option<String>,
    #[validate(email)]
    pub client_email: Option<String>,
    #[validate(required)]
    pub appointment_date: Option<String>,
    #[validate(required)]
    pub appointment_time: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl RequestAppointmentPayload {
    /// Collects every missing, blank or unparseable field into one validation error.
    pub fn into_request(self) -> Result<BookingRequest> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        let barber_id = parsed(&mut errors, "barber_id", &self.barber_id, "invalid_uuid", |raw| {
            Uuid::parse_str(raw).ok()
        });
        let client_name = parsed(&mut errors, "client_name", &self.client_name, "required", |raw| {
            Some(raw.to_string())
        });
        let client_phone = parsed(&mut errors, "client_phone", &self.client_phone, "required", |raw| {
            Some(raw.to_string())
        });
        let appointment_date = parsed(
            &mut errors,
            "appointment_date",
            &self.appointment_date,
            "invalid_date",
            parse_date,
        );
        let appointment_time = parsed(
            &mut errors,
            "appointment_time",
            &self.appointment_time,
            "invalid_time",
            parse_clock,
        );

        match (barber_id, client_name, client_phone, appointment_date, appointment_time) {
            (Some(barber_id), Some(client_name), Some(client_phone), Some(appointment_date), Some(appointment_time))
                if errors.is_empty() =>
            {
                Ok(BookingRequest {
                    barber_id,
                    service_id: self.service_id,
                    client_name,
                    client_phone,
                    client_email: self.client_email.filter(|e| !e.trim().is_empty()),
                    appointment_date,
                    appointment_time,
                    notes: self.notes.filter(|n| !n.trim().is_empty()),
                })
            }
            _ => Err(Error::Validation(errors)),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|raw| !raw.is_empty())
}

/// Parses a trimmed field. `None` is left to the derived `required` check; a blank value is
/// reported as `required`, anything `parse` rejects under `invalid_code`.
fn parsed<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<String>,
    invalid_code: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let raw = value.as_deref()?;
    let Some(trimmed) = present(value) else {
        errors.add(field, ValidationError::new("required"));
        return None;
    };
    let result = parse(trimmed);
    if result.is_none() {
        let mut error = ValidationError::new(invalid_code);
        error.add_param("value".into(), &raw);
        errors.add(field, error);
    }
    result
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCreatedResponse {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CancelPayload {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessagePayload {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_synced: Option<bool>,
}

impl TransitionResponse {
    pub fn new(appointment: &Appointment, calendar: Option<&SyncOutcome>) -> Self {
        Self {
            id: appointment.id,
            status: appointment.status.clone(),
            calendar_synced: calendar.map(SyncOutcome::is_synced),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Option<Uuid>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub duration_minutes: i32,
    pub status: String,
    pub notes: Option<String>,
    pub external_calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(value: Appointment) -> Self {
        Self {
            id: value.id,
            barber_id: value.barber_id,
            service_id: value.service_id,
            client_name: value.client_name,
            client_phone: value.client_phone,
            client_email: value.client_email,
            appointment_date: value.appointment_date,
            appointment_time: format_slot(value.appointment_time),
            duration_minutes: value.duration_minutes,
            status: value.status,
            notes: value.notes,
            external_calendar_event_id: value.external_calendar_event_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetailResponse {
    pub appointment: AppointmentResponse,
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RequestAppointmentPayload {
        RequestAppointmentPayload {
            barber_id: Some(Uuid::new_v4().to_string()),
            service_id: None,
            client_name: Some(" Ana ".into()),
            client_phone: Some("555-0101".into()),
            client_email: None,
            appointment_date: Some("2024-05-06".into()),
            appointment_time: Some("10:30".into()),
            notes: Some("   ".into()),
        }
    }

    fn rejected_fields(payload: RequestAppointmentPayload) -> Vec<(String, String)> {
        match payload.into_request() {
            Err(Error::Validation(errors)) => {
                let mut fields: Vec<(String, String)> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, errs)| {
                        errs.iter()
                            .map(move |e| (field.to_string(), e.code.to_string()))
                    })
                    .collect();
                fields.sort();
                fields
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn complete_payload_becomes_request() {
        let request = payload().into_request().unwrap();
        assert_eq!(request.client_name, "Ana");
        assert_eq!(request.appointment_date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        assert_eq!(format_slot(request.appointment_time), "10:30");
        assert!(request.notes.is_none());
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let mut incomplete = payload();
        incomplete.client_phone = None;
        incomplete.appointment_date = None;

        let fields = rejected_fields(incomplete);
        assert!(fields.iter().any(|(f, _)| f == "client_phone"));
        assert!(fields.iter().any(|(f, _)| f == "appointment_date"));
        assert!(!fields.iter().any(|(f, _)| f == "client_name"));
    }

    #[test]
    fn blank_names_count_as_missing() {
        let mut blank = payload();
        blank.client_name = Some("   ".into());
        blank.client_phone = Some("".into());

        assert_eq!(
            rejected_fields(blank),
            [
                ("client_name".to_string(), "required".to_string()),
                ("client_phone".to_string(), "required".to_string()),
            ]
        );
    }

    #[test]
    fn blank_or_malformed_ids_and_dates_are_field_errors() {
        let mut bad = payload();
        bad.barber_id = Some(" ".into());
        bad.appointment_date = Some("06/05/2024".into());

        assert_eq!(
            rejected_fields(bad),
            [
                ("appointment_date".to_string(), "invalid_date".to_string()),
                ("barber_id".to_string(), "required".to_string()),
            ]
        );

        let mut bad = payload();
        bad.barber_id = Some("not-a-uuid".into());
        assert_eq!(
            rejected_fields(bad),
            [("barber_id".to_string(), "invalid_uuid".to_string())]
        );
    }

    #[test]
    fn unparseable_time_is_rejected() {
        let mut bad = payload();
        bad.appointment_time = Some("half past ten".into());
        assert_eq!(
            rejected_fields(bad),
            [("appointment_time".to_string(), "invalid_time".to_string())]
        );
    }

    #[test]
    fn slot_query_treats_blank_params_as_missing() {
        let query = SlotQuery {
            barber_id: Some(String::new()),
            date: Some(String::new()),
        };
        assert!(matches!(query.parse(), Err(Error::BadRequest(_))));

        let barber_id = Uuid::new_v4();
        let query = SlotQuery {
            barber_id: Some(barber_id.to_string()),
            date: Some("2024-05-06".into()),
        };
        assert_eq!(
            query.parse().unwrap(),
            (barber_id, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
        );
    }
}
