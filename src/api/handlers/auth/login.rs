//! One-time code request endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    state::AuthState,
    types::{ErrorResponse, LoginRequest, LoginResponse},
    utils::{IdentifierKind, classify_identifier},
};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Code issued", body = LoginResponse),
        (status = 400, description = "Missing or invalid identifier", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let identifier = request.identifier.as_deref().map(str::trim).unwrap_or_default();

    if identifier.is_empty() {
        return bad_request("Phone number or email is required");
    }

    let Some(kind) = classify_identifier(identifier) else {
        return bad_request("Please enter a valid phone number or email");
    };

    let issued = auth_state.issuer().issue(identifier);
    let expose = auth_state.config().expose_codes();

    let mut message = match kind {
        IdentifierKind::Phone => "OTP sent to your phone".to_string(),
        IdentifierKind::Email => "OTP sent to your email".to_string(),
    };
    if expose {
        message = format!("{message}. Use: {}", issued.code);
        info!(
            kind = kind.label(),
            session_id = %issued.session_id,
            code = %issued.code,
            "one-time code issued"
        );
    } else {
        info!(kind = kind.label(), session_id = %issued.session_id, "one-time code issued");
    }

    let response = LoginResponse {
        success: true,
        message,
        session_id: issued.session_id,
        debug_otp: expose.then_some(issued.code),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::message(message))).into_response()
}
