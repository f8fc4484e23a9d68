use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        appointment_dto::AppointmentResponse,
        barber_dto::{
            CreateServicePayload, DashboardResponse, ScheduleResponse, UpdateProfilePayload,
            UpdateSchedulePayload, UpdateServicePayload,
        },
    },
    error::Result,
    services::{
        appointment_service::AppointmentFilter, auth_service::Claims,
        working_hours_service::WorkingHoursStore,
    },
    AppState,
};

const RECENT_APPOINTMENTS: i64 = 10;

#[utoipa::path(
    get,
    path = "/api/barber/dashboard",
    responses(
        (status = 200, description = "Status counts and latest appointments", body = Json<DashboardResponse>),
        (status = 401, description = "Barber token required")
    )
)]
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let barber = state.barber_service.find_profile(claims.barber_id).await?;
    let stats = state.appointment_service.status_counts(claims.barber_id).await?;
    let recent = state
        .appointment_service
        .list_for_barber(
            claims.barber_id,
            AppointmentFilter {
                limit: Some(RECENT_APPOINTMENTS),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(DashboardResponse {
        barber,
        stats,
        recent_appointments: recent.into_iter().map(AppointmentResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/barber/profile",
    responses((status = 200, description = "Own profile"))
)]
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let profile = state.barber_service.find_profile(claims.barber_id).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/barber/profile",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<UpdateProfilePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let profile = state
        .barber_service
        .update_profile(claims.barber_id, payload)
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/barber/services",
    responses((status = 200, description = "Active services, cheapest first"))
)]
#[axum::debug_handler]
pub async fn list_services(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let services = state.barber_service.list_services(claims.barber_id).await?;
    Ok(Json(services))
}

#[utoipa::path(
    post,
    path = "/api/barber/services",
    request_body = CreateServicePayload,
    responses(
        (status = 201, description = "Service created"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<CreateServicePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let service = state
        .barber_service
        .create_service(claims.barber_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    put,
    path = "/api/barber/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServicePayload,
    responses(
        (status = 200, description = "Service updated"),
        (status = 403, description = "Service belongs to another barber"),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub async fn update_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    payload: std::result::Result<Json<UpdateServicePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let service = state
        .barber_service
        .update_service(claims.barber_id, id, payload)
        .await?;
    Ok(Json(service))
}

#[utoipa::path(
    delete,
    path = "/api/barber/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Service deactivated"),
        (status = 403, description = "Service belongs to another barber"),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .barber_service
        .deactivate_service(claims.barber_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/barber/schedule",
    responses((status = 200, description = "Seven-day schedule", body = Json<ScheduleResponse>))
)]
#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let schedule = state
        .working_hours_service
        .weekly_schedule(claims.barber_id)
        .await?;
    Ok(Json(ScheduleResponse {
        days: schedule.entries(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/barber/schedule",
    request_body = UpdateSchedulePayload,
    responses(
        (status = 200, description = "Schedule replaced", body = Json<ScheduleResponse>),
        (status = 400, description = "Invalid day or hours")
    )
)]
#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<UpdateSchedulePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let changes = payload.into_changes()?;
    let schedule = state
        .working_hours_service
        .replace_schedule(claims.barber_id, &changes)
        .await?;
    Ok(Json(ScheduleResponse {
        days: schedule.entries(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/barber/appointments",
    params(
        ("status" = Option<String>, Query, description = "pending, confirmed, cancelled or completed"),
        ("date" = Option<String>, Query, description = "Date as YYYY-MM-DD"),
        ("limit" = Option<i64>, Query, description = "Maximum rows")
    ),
    responses((status = 200, description = "Own appointments, newest first"))
)]
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    filter: std::result::Result<Query<AppointmentFilter>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(filter) = filter?;
    let appointments = state
        .appointment_service
        .list_for_barber(claims.barber_id, filter)
        .await?;
    let body: Vec<AppointmentResponse> = appointments.into_iter().map(Into::into).collect();
    Ok(Json(body))
}
