//! In-memory session store.
//!
//! Each session lives in a sharded map so concurrent requests on different
//! sessions do not contend, while every mutation of a single session happens
//! under its entry lock. Expiry is decided at read time against the injected
//! clock; [`SessionStore::purge_expired`] only reclaims memory.
//!
//! The store also keeps an identifier → latest session index for inspection
//! tooling. Every removal path unlinks the index entry when it points at the
//! removed session.

use super::models::Session;
use crate::clock::Clock;
use chrono::Duration;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use thiserror::Error;
use tracing::debug;
use ulid::Ulid;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,
    #[error("session expired")]
    Expired,
    #[error("session attempts exhausted")]
    Exhausted,
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    latest: DashMap<String, String>,
    sequence: AtomicU64,
    max_attempts: u32,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_max_attempts(clock, DEFAULT_MAX_ATTEMPTS)
    }

    #[must_use]
    pub fn with_max_attempts(clock: Arc<dyn Clock>, max_attempts: u32) -> Self {
        Self {
            sessions: DashMap::new(),
            latest: DashMap::new(),
            sequence: AtomicU64::new(0),
            max_attempts: max_attempts.max(1),
            clock,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Store a new session and return its id. Never conflicts with existing
    /// sessions, including live ones for the same identifier.
    pub fn create(&self, identifier: &str, code: &str, ttl: Duration) -> String {
        self.insert(identifier, code, ttl).session_id
    }

    /// Like [`SessionStore::create`], returning a snapshot of the new session.
    pub fn insert(&self, identifier: &str, code: &str, ttl: Duration) -> Session {
        let now = self.clock.now();
        let session_id = format!("session_{}", Ulid::new());
        let session = Session {
            session_id: session_id.clone(),
            identifier: identifier.to_string(),
            code: code.to_string(),
            created_at: now,
            expires_at: now + ttl,
            attempts_used: 0,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };

        self.sessions.insert(session_id.clone(), session.clone());
        self.link(&session);

        session
    }

    /// Return the live session, treating expired records as absent.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` for unknown or expired ids.
    pub fn get(&self, session_id: &str) -> Result<Session, StoreError> {
        let now = self.clock.now();
        let snapshot = self
            .sessions
            .get(session_id)
            .map(|entry| entry.value().clone());

        match snapshot {
            Some(session) if !session.is_expired(now) => Ok(session),
            Some(_) => {
                self.remove_where(session_id, |session| session.is_expired(now));
                Err(StoreError::NotFound)
            }
            None => Err(StoreError::NotFound),
        }
    }

    /// Atomically increment the attempt counter and return the new count.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` for unknown or expired ids and
    /// `StoreError::Exhausted` once the counter has reached the cap.
    pub fn record_attempt(&self, session_id: &str) -> Result<u32, StoreError> {
        let now = self.clock.now();
        let Some(mut entry) = self.sessions.get_mut(session_id) else {
            return Err(StoreError::NotFound);
        };
        if entry.is_expired(now) {
            return Err(StoreError::NotFound);
        }
        if entry.attempts_used >= self.max_attempts {
            return Err(StoreError::Exhausted);
        }
        entry.attempts_used += 1;
        Ok(entry.attempts_used)
    }

    /// Check expiry and the attempt budget, then consume one attempt, all
    /// under the session's entry lock. Expired and exhausted sessions are
    /// deleted before the error is returned.
    ///
    /// Returns a snapshot taken after the increment.
    ///
    /// # Errors
    /// Returns `NotFound`, `Expired` or `Exhausted`.
    pub fn begin_attempt(&self, session_id: &str) -> Result<Session, StoreError> {
        let now = self.clock.now();
        let outcome = match self.sessions.entry(session_id.to_string()) {
            Entry::Vacant(_) => return Err(StoreError::NotFound),
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired(now) {
                    Err((entry.remove(), StoreError::Expired))
                } else if entry.get().attempts_used >= self.max_attempts {
                    Err((entry.remove(), StoreError::Exhausted))
                } else {
                    let session = entry.get_mut();
                    session.attempts_used += 1;
                    Ok(session.clone())
                }
            }
        };

        outcome.map_err(|(removed, err)| {
            self.unlink(&removed);
            err
        })
    }

    /// Give back one attempt consumed by [`SessionStore::begin_attempt`].
    /// No-op when the session is gone or has no attempts recorded.
    pub fn refund_attempt(&self, session_id: &str) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.attempts_used = entry.attempts_used.saturating_sub(1);
        }
    }

    /// Remove a session. Returns whether a record was actually removed, so
    /// that among concurrent callers only one observes `true`.
    pub fn delete(&self, session_id: &str) -> bool {
        self.remove_where(session_id, |_| true).is_some()
    }

    /// Most recent live session issued for `identifier`.
    #[must_use]
    pub fn latest_for(&self, identifier: &str) -> Option<Session> {
        let session_id = self
            .latest
            .get(identifier)
            .map(|entry| entry.value().clone())?;

        if let Ok(session) = self.get(&session_id) {
            Some(session)
        } else {
            self.latest.remove_if(identifier, |_, id| *id == session_id);
            None
        }
    }

    /// Most recent live session across all identifiers.
    #[must_use]
    pub fn latest(&self) -> Option<Session> {
        let now = self.clock.now();
        self.sessions
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .max_by_key(|entry| entry.sequence)
            .map(|entry| entry.value().clone())
    }

    /// Drop every expired session and any index entry left pointing at a
    /// missing one. Returns the number of sessions removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let removed = expired
            .iter()
            .filter(|session_id| {
                self.remove_where(session_id, |session| session.is_expired(now))
                    .is_some()
            })
            .count();

        self.latest
            .retain(|_, session_id| self.sessions.contains_key(session_id.as_str()));

        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn indexed_session(&self, identifier: &str) -> Option<String> {
        self.latest.get(identifier).map(|entry| entry.value().clone())
    }

    fn remove_where(
        &self,
        session_id: &str,
        predicate: impl FnOnce(&Session) -> bool,
    ) -> Option<Session> {
        let removed = self
            .sessions
            .remove_if(session_id, |_, session| predicate(session))
            .map(|(_, session)| session);
        if let Some(session) = &removed {
            self.unlink(session);
        }
        removed
    }

    /// Point the index at `session`, undoing it if the session was removed
    /// before the index entry landed.
    fn link(&self, session: &Session) {
        self.latest
            .insert(session.identifier.clone(), session.session_id.clone());
        if !self.sessions.contains_key(&session.session_id) {
            self.unlink(session);
        }
    }

    fn unlink(&self, session: &Session) {
        self.latest
            .remove_if(&session.identifier, |_, id| *id == session.session_id);
    }
}
