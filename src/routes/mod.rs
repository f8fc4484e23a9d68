pub mod appointments;
pub mod auth;
pub mod barber_panel;
pub mod barbers;
pub mod calendar;
pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::middleware::auth::{optional_barber, require_barber};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/barbers", get(barbers::search_barbers))
        .route("/api/barbers/:id", get(barbers::get_barber))
        .route(
            "/api/appointments/available-slots",
            get(appointments::available_slots),
        )
        .route("/api/appointments", post(appointments::request_appointment))
        .route("/api/appointments/:id", get(appointments::get_appointment))
        .route(
            "/api/calendar/google/callback",
            get(calendar::google_callback),
        );

    let client_or_barber = Router::new()
        .route(
            "/api/appointments/:id/cancel",
            post(appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/messages",
            post(appointments::send_message),
        )
        .route_layer(from_fn_with_state(
            state.auth_service.clone(),
            optional_barber,
        ));

    let barber_only = Router::new()
        .route(
            "/api/appointments/:id/confirm",
            post(appointments::confirm_appointment),
        )
        .route(
            "/api/appointments/:id/complete",
            post(appointments::complete_appointment),
        )
        .route("/api/barber/dashboard", get(barber_panel::dashboard))
        .route(
            "/api/barber/profile",
            get(barber_panel::get_profile).put(barber_panel::update_profile),
        )
        .route(
            "/api/barber/services",
            get(barber_panel::list_services).post(barber_panel::create_service),
        )
        .route(
            "/api/barber/services/:id",
            put(barber_panel::update_service).delete(barber_panel::delete_service),
        )
        .route(
            "/api/barber/schedule",
            get(barber_panel::get_schedule).put(barber_panel::update_schedule),
        )
        .route(
            "/api/barber/appointments",
            get(barber_panel::list_appointments),
        )
        .route("/api/calendar/connect", get(calendar::connect))
        .route("/api/calendar/status", get(calendar::status))
        .route("/api/calendar/disconnect", post(calendar::disconnect))
        .route_layer(from_fn_with_state(
            state.auth_service.clone(),
            require_barber,
        ));

    public
        .merge(client_or_barber)
        .merge(barber_only)
        .with_state(state)
}
