//! Access token lifecycle.
//!
//! Tokens are stateless HS256 JWS, but they are only honoured while present in
//! the active-set, so logout can revoke them before `exp`.

use super::{
    Identity,
    jwt::{self, AccessTokenClaims},
};
use crate::clock::Clock;
use chrono::Duration;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use ulid::Ulid;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 86_400;
pub const MASTER_USER_ID: &str = "master_user";
pub const MASTER_IDENTIFIER: &str = "master@tessera.local";
pub const MASTER_NAME: &str = "Master User";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    Malformed,
    #[error("Token has expired")]
    Expired,
    #[error("Token has been revoked")]
    Revoked,
    #[error("failed to encode token: {0}")]
    Encoding(#[source] jwt::Error),
}

impl TokenError {
    /// Short reason reported to clients of the authentication gate.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed | Self::Encoding(_) => "malformed",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

pub struct TokenAuthority {
    secret: SecretString,
    lifetime: Duration,
    master_token: Option<SecretString>,
    active: DashMap<String, i64>,
    clock: Arc<dyn Clock>,
}

impl TokenAuthority {
    #[must_use]
    pub fn new(secret: SecretString, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret,
            lifetime: Duration::seconds(DEFAULT_TOKEN_TTL_SECONDS),
            master_token: None,
            active: DashMap::new(),
            clock,
        }
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Accept this literal value as a token for the master identity.
    #[must_use]
    pub fn with_master_token(mut self, master_token: Option<SecretString>) -> Self {
        self.master_token = master_token.filter(|token| !token.expose_secret().is_empty());
        self
    }

    #[must_use]
    pub fn master_identity() -> Identity {
        Identity {
            user_id: MASTER_USER_ID.to_string(),
            identifier: MASTER_IDENTIFIER.to_string(),
            name: MASTER_NAME.to_string(),
        }
    }

    /// Sign a token for `identity` and add it to the active-set.
    ///
    /// # Errors
    /// Returns `TokenError::Encoding` if the claims cannot be signed.
    pub fn mint(&self, identity: &Identity) -> Result<String, TokenError> {
        let iat = self.clock.now().timestamp();
        let claims = AccessTokenClaims {
            sub: identity.user_id.clone(),
            identifier: identity.identifier.clone(),
            name: identity.name.clone(),
            iat,
            exp: iat + self.lifetime.num_seconds(),
            jti: Ulid::new().to_string(),
        };

        let token = jwt::sign_hs256(self.secret.expose_secret().as_bytes(), &claims)
            .map_err(TokenError::Encoding)?;
        self.active.insert(token.clone(), claims.exp);

        debug!(user_id = %identity.user_id, jti = %claims.jti, "minted access token");
        Ok(token)
    }

    /// Return the identity behind a token, checking signature, expiry and
    /// revocation in that order.
    ///
    /// # Errors
    /// Returns `Malformed`, `Expired` or `Revoked`.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        if self.is_master(token) {
            return Ok(Self::master_identity());
        }

        let claims = jwt::verify_hs256(token, self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Malformed)?;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        if !self.active.contains_key(token) {
            return Err(TokenError::Revoked);
        }

        Ok(Identity {
            user_id: claims.sub,
            identifier: claims.identifier,
            name: claims.name,
        })
    }

    /// Remove a token from the active-set. Returns whether it was there.
    pub fn revoke(&self, token: &str) -> bool {
        let revoked = self.active.remove(token).is_some();
        if revoked {
            info!("revoked access token");
        }
        revoked
    }

    /// Drop active-set entries whose `exp` has passed. Returns the count removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now().timestamp();
        let mut removed = 0;
        self.active.retain(|_, exp| {
            let keep = *exp > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(removed, "swept expired access tokens");
        }
        removed
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn is_master(&self, token: &str) -> bool {
        self.master_token
            .as_ref()
            .is_some_and(|master| master.expose_secret() == token)
    }
}
