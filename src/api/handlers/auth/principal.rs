//! Authenticated principal extraction.
//!
//! Flow Overview: read the `Authorization` header, insist on `Bearer <token>`,
//! and ask the token authority for the identity behind it.

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{state::AuthState, types::ErrorResponse, utils::parse_bearer};
use crate::token::{Identity, TokenError};

/// Authenticated caller, with the raw token kept for logout.
#[derive(Clone, Debug)]
pub struct Principal {
    pub identity: Identity,
    pub token: String,
}

#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    InvalidFormat,
    InvalidToken(TokenError),
}

impl AuthRejection {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "NO_TOKEN",
            Self::InvalidFormat => "INVALID_AUTH_FORMAT",
            Self::InvalidToken(_) => "INVALID_TOKEN",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MissingToken => "No authorization token provided".to_string(),
            Self::InvalidFormat => "Invalid authorization format. Use: Bearer <token>".to_string(),
            Self::InvalidToken(err) => err.to_string(),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut body = ErrorResponse::message(self.message()).with_code(self.code());
        if let Self::InvalidToken(err) = &self {
            body = body.with_reason(err.reason());
        }
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Resolve the bearer token into a principal, or reject with 401.
///
/// # Errors
/// Returns an [`AuthRejection`] when the header is missing, malformed, or the
/// token does not validate.
pub fn require_auth(headers: &HeaderMap, auth_state: &AuthState) -> Result<Principal, AuthRejection> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(AuthRejection::MissingToken);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(parse_bearer)
        .ok_or(AuthRejection::InvalidFormat)?;

    match auth_state.tokens().validate(token) {
        Ok(identity) => Ok(Principal {
            identity,
            token: token.to_string(),
        }),
        Err(err) => {
            debug!(reason = err.reason(), "rejected access token");
            Err(AuthRejection::InvalidToken(err))
        }
    }
}
