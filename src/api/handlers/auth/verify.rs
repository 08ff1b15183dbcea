//! Code verification endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{
    state::AuthState,
    types::{ErrorResponse, VerifyOtpRequest, VerifyOtpResponse},
};
use crate::token::Identity;

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted, token issued", body = VerifyOtpResponse),
        (status = 400, description = "Missing session id or code", body = ErrorResponse),
        (status = 401, description = "Code rejected", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn verify_otp(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Response {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let (Some(session_id), Some(otp)) = (
        request.session_id.filter(|value| !value.is_empty()),
        request.otp.filter(|value| !value.is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::message("Session ID and OTP are required")),
        )
            .into_response();
    };

    let user = match auth_state.verifier().verify(&session_id, &otp).await {
        Ok(user) => user,
        Err(err) => {
            let body = ErrorResponse::message(err.to_string()).with_code(err.code());
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }
    };

    let token = match auth_state.tokens().mint(&Identity::from(&user)) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint access token: {err}");
            let body = ErrorResponse::message("Verification failed").with_code("VERIFICATION_FAILED");
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }
    };

    let response = VerifyOtpResponse {
        success: true,
        message: "OTP verified successfully".to_string(),
        token,
        user,
    };
    (StatusCode::OK, Json(response)).into_response()
}
