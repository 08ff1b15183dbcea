//! Code inspection for QA tooling.
//!
//! Only answers when code exposure is enabled. Otherwise the route behaves as
//! if it did not exist.

use axum::{
    extract::{Extension, Query},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use super::auth::AuthState;

#[derive(Deserialize, Debug, IntoParams)]
pub struct LatestQuery {
    /// Restrict the lookup to one phone number or email.
    pub identifier: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/otp/latest",
    params(LatestQuery),
    responses(
        (status = 200, description = "Most recent live code", body = String, content_type = "text/plain"),
        (status = 404, description = "No live session, or code exposure disabled")
    ),
    tag = "inspect"
)]
pub async fn latest_otp(
    auth_state: Extension<Arc<AuthState>>,
    query: Query<LatestQuery>,
) -> Response {
    if !auth_state.config().expose_codes() {
        return not_found();
    }

    let sessions = auth_state.sessions();
    let latest = match query
        .identifier
        .as_deref()
        .map(str::trim)
        .filter(|identifier| !identifier.is_empty())
    {
        Some(identifier) => sessions.latest_for(identifier),
        None => sessions.latest(),
    };

    match latest {
        Some(session) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!(
                "Latest OTP is {} for session {}",
                session.code, session.session_id
            ),
        )
            .into_response(),
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        "No active OTP session",
    )
        .into_response()
}
