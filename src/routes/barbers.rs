use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::barber_dto::{BarberSearchQuery, PublicBarberResponse},
    error::Result,
    services::working_hours_service::WorkingHoursStore,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/barbers",
    params(
        ("neighborhood" = Option<String>, Query, description = "Substring of the neighborhood"),
        ("city" = Option<String>, Query, description = "Substring of the city")
    ),
    responses((status = 200, description = "Verified barbers"))
)]
#[axum::debug_handler]
pub async fn search_barbers(
    State(state): State<AppState>,
    query: std::result::Result<Query<BarberSearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let barbers = state.barber_service.search(&query).await?;
    Ok(Json(barbers))
}

#[utoipa::path(
    get,
    path = "/api/barbers/{id}",
    params(("id" = Uuid, Path, description = "Barber ID")),
    responses(
        (status = 200, description = "Public profile", body = Json<PublicBarberResponse>),
        (status = 404, description = "Barber not found")
    )
)]
#[axum::debug_handler]
pub async fn get_barber(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let barber = state.barber_service.get_public_profile(id).await?;
    let services = state.barber_service.list_services(id).await?;
    let schedule = state
        .working_hours_service
        .weekly_schedule(id)
        .await?
        .entries()
        .into_iter()
        .filter(|entry| entry.is_active)
        .collect();

    Ok(Json(PublicBarberResponse {
        barber,
        services,
        schedule,
    }))
}
