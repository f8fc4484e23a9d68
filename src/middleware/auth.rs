use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::services::auth_service::AuthService;

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// `Ok(None)` when no Authorization header is present.
fn bearer_token(req: &Request) -> Result<Option<String>, Response> {
    let Some(auth_header) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };
    Ok(Some(token.trim().to_string()))
}

/// Rejects requests without a valid barber token; stores the claims in extensions.
pub async fn require_barber(State(auth): State<AuthService>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(Some(token)) => token,
        Ok(None) => return unauthorized("missing_authorization"),
        Err(response) => return response,
    };

    match auth.decode_token(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => unauthorized("invalid_token"),
    }
}

/// Lets anonymous requests through untouched. A token that is present must still be valid.
pub async fn optional_barber(State(auth): State<AuthService>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(Some(token)) => token,
        Ok(None) => return next.run(req).await,
        Err(response) => return response,
    };

    match auth.decode_token(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => unauthorized("invalid_token"),
    }
}
