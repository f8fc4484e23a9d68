pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    appointment_service::{AppointmentService, AppointmentStore},
    auth_service::AuthService,
    barber_service::{BarberService, BookingCatalog},
    calendar_service::{CalendarAdapter, GoogleCalendarService},
    lifecycle_service::LifecycleService,
    slot_service::SlotService,
    working_hours_service::{WorkingHoursService, WorkingHoursStore},
};
use sqlx::PgPool;
use std::sync::Arc;

/// Stores and calendar the booking flow runs against.
#[derive(Clone)]
pub struct BookingBackend {
    pub hours: Arc<dyn WorkingHoursStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub catalog: Arc<dyn BookingCatalog>,
    pub calendar: Arc<dyn CalendarAdapter>,
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub barber_service: BarberService,
    pub working_hours_service: WorkingHoursService,
    pub appointment_service: AppointmentService,
    pub calendar_service: GoogleCalendarService,
    pub slot_service: SlotService,
    pub lifecycle_service: LifecycleService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let calendar_service = google_calendar(&pool, config);
        let backend = BookingBackend {
            hours: Arc::new(WorkingHoursService::new(pool.clone())),
            appointments: Arc::new(AppointmentService::new(pool.clone())),
            catalog: Arc::new(BarberService::new(pool.clone())),
            calendar: Arc::new(calendar_service.clone()),
        };
        Self::assemble(pool, config, calendar_service, backend)
    }

    /// Postgres for the barber panel, `backend` for slots and the appointment lifecycle.
    pub fn with_booking_backend(pool: PgPool, config: &Config, backend: BookingBackend) -> Self {
        let calendar_service = google_calendar(&pool, config);
        Self::assemble(pool, config, calendar_service, backend)
    }

    fn assemble(
        pool: PgPool,
        config: &Config,
        calendar_service: GoogleCalendarService,
        backend: BookingBackend,
    ) -> Self {
        let slot_service = SlotService::new(backend.hours, backend.appointments.clone());
        let lifecycle_service = LifecycleService::new(
            backend.appointments,
            backend.catalog,
            backend.calendar,
            slot_service.clone(),
        );

        Self {
            auth_service: AuthService::new(
                pool.clone(),
                config.jwt_secret.clone(),
                config.jwt_ttl_hours,
            ),
            barber_service: BarberService::new(pool.clone()),
            working_hours_service: WorkingHoursService::new(pool.clone()),
            appointment_service: AppointmentService::new(pool),
            calendar_service,
            slot_service,
            lifecycle_service,
        }
    }
}

fn google_calendar(pool: &PgPool, config: &Config) -> GoogleCalendarService {
    GoogleCalendarService::new(
        pool.clone(),
        config.google.clone(),
        config.calendar_timezone.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn postgres_state_shares_one_calendar_client() {
        let config = Config {
            server_address: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/unused".into(),
            database_max_connections: 1,
            jwt_secret: "test_secret_key".into(),
            jwt_ttl_hours: 1,
            calendar_timezone: "UTC".into(),
            google: None,
        };
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();

        let state = AppState::new(pool, &config);
        assert!(!state.calendar_service.is_enabled());
        assert!(state.calendar_service.authorization_url("signed-state").is_err());
    }
}
