use super::{DEFAULT_USER_NAME, DirectoryError, UserDirectory, UserIdentity};
use crate::clock::Clock;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use ulid::Ulid;

/// Process-local directory. Users are keyed by normalized identifier and live
/// as long as the process.
pub struct MemoryDirectory {
    users: DashMap<String, UserIdentity>,
    clock: Arc<dyn Clock>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: DashMap::new(),
            clock,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Emails compare case-insensitively, phone numbers ignore whitespace.
pub(crate) fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.chars().filter(|c| !c.is_whitespace()).collect()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn resolve(&self, identifier: &str) -> Result<UserIdentity, DirectoryError> {
        let key = normalize_identifier(identifier);
        if key.is_empty() {
            return Err(DirectoryError::EmptyIdentifier);
        }

        let mut created = false;
        let user = self
            .users
            .entry(key.clone())
            .or_insert_with(|| {
                created = true;
                let is_email = key.contains('@');
                UserIdentity {
                    id: format!("user_{}", Ulid::new()),
                    name: DEFAULT_USER_NAME.to_string(),
                    email: is_email.then(|| key.clone()),
                    phone: (!is_email).then(|| key.clone()),
                    created_at: self.clock.now(),
                }
            })
            .value()
            .clone();

        if created {
            info!(user_id = %user.id, "created user");
        } else {
            info!(user_id = %user.id, "resolved existing user");
        }
        Ok(user)
    }
}
