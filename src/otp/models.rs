use chrono::{DateTime, Utc};
use std::fmt;

/// Pending one-time-code challenge held by the [`SessionStore`](super::SessionStore).
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub identifier: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts_used: u32,
    /// Monotonic issue order, used to find the most recent session when
    /// several share the same `created_at`.
    pub sequence: u64,
}

impl Session {
    /// A session is dead strictly after `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>, max_attempts: u32) -> bool {
        !self.is_expired(now) && self.attempts_used < max_attempts
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("identifier", &self.identifier)
            .field("code", &"***")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("attempts_used", &self.attempts_used)
            .field("sequence", &self.sequence)
            .finish()
    }
}
