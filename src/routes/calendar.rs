use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use validator::{ValidationError, ValidationErrors};

use crate::{
    dto::calendar_dto::{CalendarStatusResponse, ConnectResponse, OAuthCallbackQuery},
    error::{Error, Result},
    services::auth_service::Claims,
    utils::crypto::{sign_oauth_state, verify_oauth_state},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/calendar/connect",
    responses(
        (status = 200, description = "Google consent URL", body = Json<ConnectResponse>),
        (status = 400, description = "Calendar sync not configured")
    )
)]
#[axum::debug_handler]
pub async fn connect(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let oauth_state = sign_oauth_state(claims.barber_id, state.auth_service.jwt_secret())?;
    let auth_url = state.calendar_service.authorization_url(&oauth_state)?;
    Ok(Json(ConnectResponse { auth_url }))
}

#[utoipa::path(
    get,
    path = "/api/calendar/google/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "Signed barber id")
    ),
    responses(
        (status = 200, description = "Calendar connected", body = Json<CalendarStatusResponse>),
        (status = 401, description = "State does not verify"),
        (status = 502, description = "Token exchange failed")
    )
)]
#[axum::debug_handler]
pub async fn google_callback(
    State(state): State<AppState>,
    query: std::result::Result<Query<OAuthCallbackQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    if let Some(error) = query.error {
        return Err(Error::Integration(format!("Google authorization denied: {}", error)));
    }

    let barber_id = query
        .state
        .as_deref()
        .and_then(|s| verify_oauth_state(s, state.auth_service.jwt_secret()))
        .ok_or_else(|| Error::Unauthorized("Invalid OAuth state".to_string()))?;

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        let mut errors = ValidationErrors::new();
        errors.add("code", ValidationError::new("required"));
        return Err(errors.into());
    };

    let tokens = state.calendar_service.exchange_code(&code).await?;
    state
        .calendar_service
        .save_credentials(barber_id, &tokens)
        .await?;

    Ok(Json(CalendarStatusResponse { connected: true }))
}

#[utoipa::path(
    post,
    path = "/api/calendar/disconnect",
    responses((status = 200, description = "Calendar disconnected", body = Json<CalendarStatusResponse>))
)]
#[axum::debug_handler]
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    state.calendar_service.disconnect(claims.barber_id).await?;
    Ok(Json(CalendarStatusResponse { connected: false }))
}

#[utoipa::path(
    get,
    path = "/api/calendar/status",
    responses((status = 200, description = "Whether a calendar is connected", body = Json<CalendarStatusResponse>))
)]
#[axum::debug_handler]
pub async fn status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let connected = state.calendar_service.is_connected(claims.barber_id).await?;
    Ok(Json(CalendarStatusResponse { connected }))
}
