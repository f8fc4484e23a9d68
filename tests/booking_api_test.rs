use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use barbershop_booking::{
    config::Config,
    models::working_hours::{DayHours, WeeklySchedule},
    routes,
    services::{
        calendar_service::{CalendarAdapter, CalendarError, CalendarEvent},
        memory::MemoryBackend,
    },
    utils::time::parse_clock,
    AppState, BookingBackend,
};
use chrono::Weekday;
use serde_json::{json, Value as JsonValue};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const MONDAY: &str = "2024-05-06";

/// Calendar that is never reachable.
struct OfflineCalendar;

#[async_trait]
impl CalendarAdapter for OfflineCalendar {
    async fn push_confirmed_event(
        &self,
        _barber_id: Uuid,
        _event: &CalendarEvent,
    ) -> Result<String, CalendarError> {
        Err(CalendarError::NotConnected)
    }

    async fn delete_event(&self, _barber_id: Uuid, _event_id: &str) -> Result<(), CalendarError> {
        Err(CalendarError::NotConnected)
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    barber_id: Uuid,
}

impl TestApp {
    fn token_for(&self, barber_id: Uuid, name: &str) -> String {
        self.state
            .auth_service
            .issue_token(Uuid::new_v4(), barber_id, name, "barber")
            .expect("token")
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn slots(&self) -> Vec<String> {
        let (status, body) = self
            .send(
                "GET",
                &format!(
                    "/api/appointments/available-slots?barber_id={}&date={}",
                    self.barber_id, MONDAY
                ),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_value(body["slots"].clone()).unwrap()
    }
}

fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://localhost/unused".into(),
        database_max_connections: 1,
        jwt_secret: "test_secret_key".into(),
        jwt_ttl_hours: 1,
        calendar_timezone: "UTC".into(),
        google: None,
    }
}

fn setup() -> TestApp {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    let backend = Arc::new(MemoryBackend::default());
    let barber_id = backend.add_barber("Marco");
    let mut week = WeeklySchedule::default();
    week.set(
        Weekday::Mon,
        Some(DayHours {
            start_time: parse_clock("09:00").unwrap(),
            end_time: parse_clock("12:00").unwrap(),
        }),
    );
    backend.set_hours(barber_id, week);

    let state = AppState::with_booking_backend(
        pool,
        &config,
        BookingBackend {
            hours: backend.clone(),
            appointments: backend.clone(),
            catalog: backend,
            calendar: Arc::new(OfflineCalendar),
        },
    );

    TestApp {
        app: routes::router(state.clone()),
        state,
        barber_id,
    }
}

fn booking(barber_id: Uuid, time: &str) -> JsonValue {
    json!({
        "barber_id": barber_id,
        "client_name": "Ana",
        "client_phone": "555-0101",
        "appointment_date": MONDAY,
        "appointment_time": time,
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let t = setup();
    let (status, body) = t.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn slot_query_requires_barber_and_date() {
    let t = setup();
    let (status, body) = t
        .send("GET", "/api/appointments/available-slots?date=2024-05-06", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert_eq!(
        t.slots().await,
        ["09:00", "09:30", "10:00", "10:30", "11:00", "11:30"]
    );
}

#[tokio::test]
async fn booking_flow_end_to_end() {
    let t = setup();
    let owner = t.token_for(t.barber_id, "Marco");
    let stranger = t.token_for(Uuid::new_v4(), "Luis");

    let (status, body) = t
        .send("POST", "/api/appointments", None, Some(booking(t.barber_id, "10:00")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = t
        .send("POST", "/api/appointments", None, Some(booking(t.barber_id, "10:00")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(!t.slots().await.contains(&"10:00".to_string()));

    let confirm = format!("/api/appointments/{}/confirm", id);
    let (status, _) = t.send("POST", &confirm, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = t.send("POST", &confirm, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.send("POST", &confirm, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["calendar_synced"], false);

    let (status, _) = t.send("POST", &confirm, Some(&owner), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .send(
            "POST",
            &format!("/api/appointments/{}/messages", id),
            None,
            Some(json!({ "message": "Running 5 minutes late" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sender_type"], "client");
    assert_eq!(body["sender_name"], "Ana");

    let (status, body) = t
        .send(
            "POST",
            &format!("/api/appointments/{}/cancel", id),
            None,
            Some(json!({ "reason": "fever" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = t
        .send("GET", &format!("/api/appointments/{}", id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["appointment_time"], "10:00");
    let bodies: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(
        bodies,
        [
            "Appointment request sent",
            "Appointment confirmed",
            "Running 5 minutes late",
            "Appointment cancelled. Reason: fever",
        ]
    );

    assert!(t.slots().await.contains(&"10:00".to_string()));
}

#[tokio::test]
async fn cancel_without_body_uses_default_reason() {
    let t = setup();
    let (_, body) = t
        .send("POST", "/api/appointments", None, Some(booking(t.barber_id, "11:30")))
        .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = t
        .send("POST", &format!("/api/appointments/{}/cancel", id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = t
        .send("GET", &format!("/api/appointments/{}", id), None, None)
        .await;
    assert_eq!(
        body["messages"][1]["body"],
        "Appointment cancelled. Reason: unspecified"
    );
}

#[tokio::test]
async fn invalid_payloads_and_tokens_are_rejected() {
    let t = setup();

    let (status, body) = t
        .send(
            "POST",
            "/api/appointments",
            None,
            Some(json!({ "barber_id": t.barber_id, "client_name": "Ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["fields"]["client_phone"].is_array());

    let (status, _) = t
        .send("POST", "/api/appointments", None, Some(booking(Uuid::new_v4(), "10:00")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .send("POST", "/api/appointments", None, Some(booking(t.barber_id, "12:00")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .send(
            "POST",
            &format!("/api/appointments/{}/cancel", Uuid::new_v4()),
            Some("not-a-jwt"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = t.send("GET", "/api/barber/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send("GET", &format!("/api/appointments/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_or_malformed_request_fields_are_json_validation_errors() {
    let t = setup();

    let mut blank_name = booking(t.barber_id, "10:00");
    blank_name["client_name"] = json!("   ");
    let (status, body) = t.send("POST", "/api/appointments", None, Some(blank_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["client_name"][0]["code"], "required");

    let mut blank_ids = booking(t.barber_id, "10:00");
    blank_ids["barber_id"] = json!("");
    blank_ids["appointment_date"] = json!("");
    let (status, body) = t.send("POST", "/api/appointments", None, Some(blank_ids)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["fields"]["barber_id"].is_array());
    assert!(body["fields"]["appointment_date"].is_array());

    let mut bad_uuid = booking(t.barber_id, "10:00");
    bad_uuid["barber_id"] = json!("barber-1");
    let (status, body) = t.send("POST", "/api/appointments", None, Some(bad_uuid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["barber_id"][0]["code"], "invalid_uuid");

    let mut wrong_type = booking(t.barber_id, "10:00");
    wrong_type["client_phone"] = json!(5550101);
    let (status, body) = t.send("POST", "/api/appointments", None, Some(wrong_type)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t
        .send("GET", "/api/appointments/available-slots?barber_id=&date=", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t
        .send(
            "GET",
            &format!("/api/appointments/available-slots?barber_id={}&date=tomorrow", t.barber_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert_eq!(t.slots().await.len(), 6);
}

#[tokio::test]
async fn calendar_connect_is_refused_when_unconfigured() {
    let t = setup();
    let owner = t.token_for(t.barber_id, "Marco");

    let (status, _) = t.send("GET", "/api/calendar/connect", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send("GET", "/api/calendar/google/callback?code=abc&state=forged", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
