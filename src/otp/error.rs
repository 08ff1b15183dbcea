use super::store::StoreError;
use crate::directory::DirectoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Invalid or expired session")]
    SessionNotFound,
    #[error("OTP expired")]
    SessionExpired,
    #[error("Too many attempts. Please try again.")]
    AttemptsExhausted,
    #[error("Invalid OTP")]
    CodeMismatch,
    #[error("Verification failed")]
    IdentityResolutionFailed(#[source] DirectoryError),
}

impl VerifyError {
    /// Stable machine-readable code returned to HTTP clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound => "SESSION_INVALID",
            Self::SessionExpired => "OTP_EXPIRED",
            Self::AttemptsExhausted => "TOO_MANY_ATTEMPTS",
            Self::CodeMismatch => "INVALID_OTP",
            Self::IdentityResolutionFailed(_) => "VERIFICATION_FAILED",
        }
    }
}

impl From<StoreError> for VerifyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::SessionNotFound,
            StoreError::Expired => Self::SessionExpired,
            StoreError::Exhausted => Self::AttemptsExhausted,
        }
    }
}
