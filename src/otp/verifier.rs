//! Code verification.
//!
//! Flow Overview: consume one attempt under the session lock, compare the
//! submitted code, resolve the user, then delete the session. The delete
//! result decides the winner when the same correct code races itself.

use super::{error::VerifyError, store::SessionStore};
use crate::directory::{UserDirectory, UserIdentity};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Verifier {
    store: Arc<SessionStore>,
    directory: Arc<dyn UserDirectory>,
}

impl Verifier {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Check `code` against the session and return the resolved user.
    ///
    /// # Errors
    /// Returns a [`VerifyError`] describing why the code was not accepted.
    pub async fn verify(&self, session_id: &str, code: &str) -> Result<UserIdentity, VerifyError> {
        let session = self.store.begin_attempt(session_id).map_err(|err| {
            let err = VerifyError::from(err);
            info!(session_id, reason = err.code(), "verification rejected");
            err
        })?;

        if !constant_time_eq::constant_time_eq(session.code.as_bytes(), code.as_bytes()) {
            info!(
                session_id,
                attempts_used = session.attempts_used,
                max_attempts = self.store.max_attempts(),
                "invalid code submitted"
            );
            return Err(VerifyError::CodeMismatch);
        }

        // The session stays in place until the user is known. A failed
        // lookup gives the attempt back.
        let user = self
            .directory
            .resolve(&session.identifier)
            .await
            .map_err(|err| {
                warn!(session_id, "identity resolution failed: {err}");
                self.store.refund_attempt(session_id);
                VerifyError::IdentityResolutionFailed(err)
            })?;

        if !self.store.delete(session_id) {
            info!(session_id, "session consumed by a concurrent verification");
            return Err(VerifyError::SessionNotFound);
        }

        info!(session_id, user_id = %user.id, "code verified");
        Ok(user)
    }
}
