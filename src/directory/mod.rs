//! User lookup behind the verifier.
//!
//! The verifier only needs `resolve(identifier)`; anything that can map a phone
//! number or email to a user record can sit behind [`UserDirectory`].

pub mod memory;

pub use memory::MemoryDirectory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const DEFAULT_USER_NAME: &str = "New User";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("identifier is empty")]
    EmptyIdentifier,
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Directory record returned to clients after a successful verification.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserIdentity {
    /// The phone number or email this user logs in with.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.email
            .as_deref()
            .or(self.phone.as_deref())
            .unwrap_or_default()
    }
}

/// Resolve an identifier to a user, creating the user when absent.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<UserIdentity, DirectoryError>;
}
