//! Needs a disposable Postgres in DATABASE_URL: `cargo test -- --ignored`.

use std::env;

use barbershop_booking::{
    database::pool::run_migrations,
    dto::auth_dto::RegisterPayload,
    error::Error,
    models::{
        appointment::{AppointmentStatus, NewAppointment},
        message::{MessageDraft, SenderType},
        working_hours::DayHours,
    },
    services::{
        appointment_service::{AppointmentFilter, AppointmentService, AppointmentStore},
        auth_service::AuthService,
        working_hours_service::{ScheduleChange, WorkingHoursService, WorkingHoursStore},
    },
    utils::time::parse_clock,
};
use chrono::{NaiveDate, Weekday};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

async fn pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}

async fn register_barber(pool: &PgPool) -> Uuid {
    let auth = AuthService::new(pool.clone(), "test_secret_key".into(), 1);
    let suffix = Uuid::new_v4();
    auth.register(RegisterPayload {
        name: "Marco".into(),
        email: format!("marco_{}@example.com", suffix),
        password: "hunter22".into(),
        password_confirmation: "hunter22".into(),
        phone: None,
        shop_name: "Marco's".into(),
        address: "Av. Corrientes 1234".into(),
        neighborhood: "Almagro".into(),
        city: "Buenos Aires".into(),
        description: None,
        hourly_rate: None,
    })
    .await
    .expect("register")
    .barber_id
}

fn booking(barber_id: Uuid, time: &str) -> NewAppointment {
    NewAppointment {
        barber_id,
        service_id: None,
        client_name: "Ana".into(),
        client_phone: "555-0101".into(),
        client_email: None,
        appointment_date: NaiveDate::from_ymd_opt(2030, 5, 6).unwrap(),
        appointment_time: parse_clock(time).unwrap(),
        duration_minutes: 30,
        notes: None,
    }
}

fn draft(body: &str) -> MessageDraft {
    MessageDraft::new(SenderType::Client, "Ana", body)
}

#[tokio::test]
#[ignore]
async fn schedule_replace_upserts_and_closes_days() {
    let pool = pool().await;
    let barber_id = register_barber(&pool).await;
    let service = WorkingHoursService::new(pool.clone());
    let hours = DayHours {
        start_time: parse_clock("09:00").unwrap(),
        end_time: parse_clock("12:00").unwrap(),
    };

    service
        .replace_schedule(
            barber_id,
            &[
                ScheduleChange { day: Weekday::Mon, hours: Some(hours) },
                ScheduleChange { day: Weekday::Tue, hours: Some(hours) },
            ],
        )
        .await
        .unwrap();
    let week = service
        .replace_schedule(barber_id, &[ScheduleChange { day: Weekday::Tue, hours: None }])
        .await
        .unwrap();

    assert_eq!(week.get(Weekday::Mon), Some(&hours));
    assert!(week.get(Weekday::Tue).is_none());
    assert_eq!(
        service.day_hours(barber_id, Weekday::Mon).await.unwrap(),
        Some(hours)
    );

    let rows = service.list(barber_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.day_of_week == 2 && !r.is_active));
}

#[tokio::test]
#[ignore]
async fn live_slot_is_unique_until_cancelled() {
    let pool = pool().await;
    let barber_id = register_barber(&pool).await;
    let store = AppointmentService::new(pool.clone());

    let first = store
        .create_with_message(booking(barber_id, "10:00"), draft("hi"))
        .await
        .unwrap();
    let err = store
        .create_with_message(booking(barber_id, "10:00"), draft("again"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let cancelled = store
        .transition(
            first.id,
            AppointmentStatus::Cancelled.allowed_sources(),
            AppointmentStatus::Cancelled,
            draft("Appointment cancelled. Reason: unspecified"),
        )
        .await
        .unwrap();
    assert!(cancelled.is_some());

    store
        .create_with_message(booking(barber_id, "10:00"), draft("retry"))
        .await
        .unwrap();

    let counts = store.status_counts(barber_id).await.unwrap();
    assert_eq!((counts.pending, counts.cancelled), (1, 1));
    assert_eq!(store.messages(first.id).await.unwrap().len(), 2);

    assert_eq!(store.delete(first.id).await.unwrap(), 1);
    assert!(store.find(first.id).await.unwrap().is_none());
    assert!(store.messages(first.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn conditional_transition_rejects_wrong_source_status() {
    let pool = pool().await;
    let barber_id = register_barber(&pool).await;
    let store = AppointmentService::new(pool.clone());

    let created = store
        .create_with_message(booking(barber_id, "11:00"), draft("hi"))
        .await
        .unwrap();

    let completed = store
        .transition(
            created.id,
            AppointmentStatus::Completed.allowed_sources(),
            AppointmentStatus::Completed,
            draft("Appointment completed"),
        )
        .await
        .unwrap();
    assert!(completed.is_none());
    assert_eq!(store.messages(created.id).await.unwrap().len(), 1);

    let listed = store
        .list_for_barber(
            barber_id,
            AppointmentFilter {
                status: Some(AppointmentStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn duplicate_email_is_a_conflict() {
    let pool = pool().await;
    let auth = AuthService::new(pool.clone(), "test_secret_key".into(), 1);
    let email = format!("dup_{}@example.com", Uuid::new_v4());
    let payload = RegisterPayload {
        name: "Luis".into(),
        email,
        password: "hunter22".into(),
        password_confirmation: "hunter22".into(),
        phone: None,
        shop_name: "Luis Cuts".into(),
        address: "Calle 1".into(),
        neighborhood: "Palermo".into(),
        city: "Buenos Aires".into(),
        description: None,
        hourly_rate: None,
    };

    auth.register(payload.clone()).await.unwrap();
    let err = auth.register(payload).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}
