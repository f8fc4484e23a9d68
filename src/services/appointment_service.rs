use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::Result;
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment, StatusCounts};
use crate::models::message::{Message, MessageDraft};
use crate::services::message_service::{insert_message, MessageService};
use crate::utils::time::truncate_to_minute;

const APPOINTMENT_COLUMNS: &str = "id, barber_id, service_id, client_name, client_phone, client_email, \
     appointment_date, appointment_time, duration_minutes, status, notes, \
     external_calendar_event_id, created_at, updated_at";

/// Persistence for appointments and their message thread.
///
/// Every method that changes an appointment also writes its message, and the two
/// writes succeed or fail together.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// Start times held by non-cancelled appointments of the barber on `date`.
    async fn booked_times(&self, barber_id: Uuid, date: NaiveDate) -> Result<HashSet<NaiveTime>>;

    /// Fails with `Error::Conflict` if another live appointment already holds the slot.
    async fn create_with_message(
        &self,
        appointment: NewAppointment,
        message: MessageDraft,
    ) -> Result<Appointment>;

    /// Moves the appointment to `to` only if its current status is in `from`.
    /// Returns `None` when the appointment was not in an allowed status.
    async fn transition(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
        message: MessageDraft,
    ) -> Result<Option<Appointment>>;

    async fn set_external_event_id(&self, id: Uuid, event_id: &str) -> Result<()>;

    async fn append_message(&self, appointment_id: Uuid, message: MessageDraft) -> Result<Message>;

    async fn messages(&self, appointment_id: Uuid) -> Result<Vec<Message>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct AppointmentService {
    pool: PgPool,
    messages: MessageService,
}

impl AppointmentService {
    pub fn new(pool: PgPool) -> Self {
        let messages = MessageService::new(pool.clone());
        Self { pool, messages }
    }

    pub async fn list_for_barber(
        &self,
        barber_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>> {
        let mut sql = format!("SELECT {} FROM appointments WHERE barber_id = $1", APPOINTMENT_COLUMNS);
        let mut next_param = 2;

        if filter.status.is_some() {
            sql.push_str(&format!(" AND status = ${}", next_param));
            next_param += 1;
        }
        if filter.date.is_some() {
            sql.push_str(&format!(" AND appointment_date = ${}", next_param));
            next_param += 1;
        }
        sql.push_str(" ORDER BY appointment_date DESC, appointment_time DESC");
        if filter.limit.is_some() {
            sql.push_str(&format!(" LIMIT ${}", next_param));
        }

        let mut query = sqlx::query_as::<_, Appointment>(&sql).bind(barber_id);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(date) = filter.date {
            query = query.bind(date);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit.clamp(1, 500));
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn status_counts(&self, barber_id: Uuid) -> Result<StatusCounts> {
        let counts = sqlx::query_as::<_, StatusCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled
            FROM appointments
            WHERE barber_id = $1
            "#,
        )
        .bind(barber_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Hard delete. Not part of the lifecycle; messages go with the row.
    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AppointmentStore for AppointmentService {
    async fn find(&self, id: Uuid) -> Result<Option<Appointment>> {
        let sql = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        let appointment = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(appointment)
    }

    async fn booked_times(&self, barber_id: Uuid, date: NaiveDate) -> Result<HashSet<NaiveTime>> {
        let times: Vec<NaiveTime> = sqlx::query_scalar(
            r#"
            SELECT appointment_time FROM appointments
            WHERE barber_id = $1 AND appointment_date = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(times.into_iter().map(truncate_to_minute).collect())
    }

    async fn create_with_message(
        &self,
        appointment: NewAppointment,
        message: MessageDraft,
    ) -> Result<Appointment> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO appointments (
                barber_id, service_id, client_name, client_phone, client_email,
                appointment_date, appointment_time, duration_minutes, notes, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        let created = sqlx::query_as::<_, Appointment>(&sql)
            .bind(appointment.barber_id)
            .bind(appointment.service_id)
            .bind(&appointment.client_name)
            .bind(&appointment.client_phone)
            .bind(&appointment.client_email)
            .bind(appointment.appointment_date)
            .bind(appointment.appointment_time)
            .bind(appointment.duration_minutes)
            .bind(&appointment.notes)
            .fetch_one(&mut *tx)
            .await?;

        insert_message(&mut *tx, created.id, &message).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
        message: MessageDraft,
    ) -> Result<Option<Appointment>> {
        let allowed: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE appointments
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .bind(to.as_str())
            .bind(&allowed)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        insert_message(&mut *tx, id, &message).await?;
        tx.commit().await?;

        Ok(Some(updated))
    }

    async fn set_external_event_id(&self, id: Uuid, event_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET external_calendar_event_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_message(&self, appointment_id: Uuid, message: MessageDraft) -> Result<Message> {
        self.messages.create(appointment_id, &message).await
    }

    async fn messages(&self, appointment_id: Uuid) -> Result<Vec<Message>> {
        self.messages.get_by_appointment(appointment_id).await
    }
}
