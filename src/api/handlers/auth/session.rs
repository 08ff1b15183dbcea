//! Endpoints behind the bearer-token gate.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    principal::require_auth,
    state::AuthState,
    types::{ErrorResponse, MeResponse, MessageResponse},
};

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(rejection) => return rejection.into_response(),
    };

    if !auth_state.tokens().revoke(&principal.token) {
        // Master token is never in the active-set.
        debug!(user_id = %principal.identity.user_id, "logout for a token outside the active-set");
    }
    info!(user_id = %principal.identity.user_id, "logged out");

    let response = MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    match require_auth(&headers, &auth_state) {
        Ok(principal) => {
            let response = MeResponse {
                success: true,
                user: principal.identity,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(rejection) => rejection.into_response(),
    }
}
