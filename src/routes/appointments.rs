use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::appointment_dto::{
        AppointmentCreatedResponse, AppointmentDetailResponse, AppointmentResponse, CancelPayload,
        MessagePayload, RequestAppointmentPayload, SlotQuery, SlotsResponse, TransitionResponse,
    },
    error::Result,
    services::{auth_service::Claims, lifecycle_service::Actor},
    utils::time::format_slot,
    AppState,
};

fn actor(claims: Option<Extension<Claims>>) -> Actor {
    claims
        .map(|Extension(claims)| claims.actor())
        .unwrap_or(Actor::Anonymous)
}

#[utoipa::path(
    get,
    path = "/api/appointments/available-slots",
    params(
        ("barber_id" = Uuid, Query, description = "Barber ID"),
        ("date" = String, Query, description = "Date as YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Free start times", body = Json<SlotsResponse>),
        (status = 400, description = "Missing barber_id or date")
    )
)]
#[axum::debug_handler]
pub async fn available_slots(
    State(state): State<AppState>,
    query: std::result::Result<Query<SlotQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let (barber_id, date) = query.parse()?;

    let slots = state.slot_service.available_slots(barber_id, date).await?;
    Ok(Json(SlotsResponse {
        barber_id,
        date,
        slots: slots.into_iter().map(format_slot).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = RequestAppointmentPayload,
    responses(
        (status = 201, description = "Appointment requested", body = Json<AppointmentCreatedResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Barber or service not found"),
        (status = 409, description = "Slot not available")
    )
)]
#[axum::debug_handler]
pub async fn request_appointment(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RequestAppointmentPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let request = payload.into_request()?;
    let appointment = state.lifecycle_service.request(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(AppointmentCreatedResponse {
            id: appointment.id,
            status: appointment.status,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment with its messages", body = Json<AppointmentDetailResponse>),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let thread = state.lifecycle_service.view(id).await?;
    Ok(Json(AppointmentDetailResponse {
        appointment: AppointmentResponse::from(thread.appointment),
        messages: thread.messages,
    }))
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/confirm",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment confirmed", body = Json<TransitionResponse>),
        (status = 401, description = "Barber token required"),
        (status = 403, description = "Appointment belongs to another barber"),
        (status = 409, description = "Appointment is not pending")
    )
)]
#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state.lifecycle_service.confirm(id, &claims.actor()).await?;
    Ok(Json(TransitionResponse::new(
        &result.appointment,
        result.calendar.as_ref(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = CancelPayload,
    responses(
        (status = 200, description = "Appointment cancelled", body = Json<TransitionResponse>),
        (status = 403, description = "Appointment belongs to another barber"),
        (status = 409, description = "Appointment already closed")
    )
)]
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelPayload>>,
) -> Result<impl IntoResponse> {
    let reason = payload.and_then(|Json(p)| p.reason);
    let result = state
        .lifecycle_service
        .cancel(id, &actor(claims), reason)
        .await?;
    Ok(Json(TransitionResponse::new(
        &result.appointment,
        result.calendar.as_ref(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/complete",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment completed", body = Json<TransitionResponse>),
        (status = 403, description = "Appointment belongs to another barber"),
        (status = 409, description = "Appointment is not confirmed")
    )
)]
#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state.lifecycle_service.complete(id, &claims.actor()).await?;
    Ok(Json(TransitionResponse::new(&result.appointment, None)))
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/messages",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = MessagePayload,
    responses(
        (status = 201, description = "Message appended"),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<Uuid>,
    payload: std::result::Result<Json<MessagePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let message = state
        .lifecycle_service
        .send_message(id, &actor(claims), &payload.message)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
