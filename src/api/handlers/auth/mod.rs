//! Auth handlers and supporting modules.
//!
//! ## Login flow
//!
//! 1. `POST /auth/login` validates the identifier and issues a 6-digit code
//!    bound to a new session.
//! 2. `POST /auth/verify-otp` checks the code and exchanges it for a signed
//!    access token.
//! 3. `GET /auth/me` and `POST /auth/logout` sit behind the bearer-token gate.
//!
//! ## Testing aids
//!
//! The fixed demo code, the master token and code exposure are all off unless
//! configured explicitly. They exist for QA tooling and must never be enabled
//! on a shared deployment.

pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;
pub(crate) mod verify;

pub use principal::{AuthRejection, Principal, require_auth};
pub use state::{AuthConfig, AuthState, MAX_TTL_SECONDS};

#[cfg(test)]
mod tests;
