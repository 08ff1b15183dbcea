//! Background sweepers for expired sessions and tokens.
//!
//! Expiry is enforced at read time; these workers only reclaim memory.

use super::handlers::auth::AuthState;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

/// Purge expired sessions every `period`.
pub fn spawn_session_sweeper(auth_state: Arc<AuthState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = auth_state.sessions().purge_expired();
            debug!(removed, remaining = auth_state.sessions().len(), "session sweep");
        }
    })
}

/// Drop expired entries from the token active-set every `period`.
pub fn spawn_token_sweeper(auth_state: Arc<AuthState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = auth_state.tokens().sweep();
            debug!(removed, active = auth_state.tokens().active_count(), "token sweep");
        }
    })
}
