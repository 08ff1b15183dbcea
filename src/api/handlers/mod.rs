//! API handlers for tessera.
//!
//! Auth endpoints live under [`auth`]; [`health`] and the code inspection route
//! sit beside them.

pub mod auth;
pub mod health;
pub mod inspect;

use axum::{Json, http::StatusCode, response::IntoResponse};

use auth::types::ErrorResponse;

/// Fallback for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::message("Endpoint not found")),
    )
}
