pub mod authority;
pub mod jwt;

pub use authority::{TokenAuthority, TokenError};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subject of an access token.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub identifier: String,
    pub name: String,
}

impl From<&crate::directory::UserIdentity> for Identity {
    fn from(user: &crate::directory::UserIdentity) -> Self {
        Self {
            user_id: user.id.clone(),
            identifier: user.identifier().to_string(),
            name: user.name.clone(),
        }
    }
}
