use super::store::SessionStore;
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, rngs::OsRng};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, info};

pub const CODE_LENGTH: usize = 6;
pub const DEFAULT_CODE_TTL_SECONDS: i64 = 300;

/// What happens to an identifier's earlier live session on a new login.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Earlier sessions stay valid until their own expiry.
    #[default]
    Concurrent,
    /// The latest earlier session is deleted before the new one is created.
    Supersede,
}

impl SessionPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concurrent => "concurrent",
            Self::Supersede => "supersede",
        }
    }
}

impl fmt::Display for SessionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(Self::Concurrent),
            "supersede" => Ok(Self::Supersede),
            other => Err(format!(
                "unknown session policy '{other}', expected concurrent or supersede"
            )),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub session_id: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCode")
            .field("session_id", &self.session_id)
            .field("code", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Uniform 6-digit code, leading zeros included.
#[must_use]
pub fn generate_code() -> String {
    let value: u32 = OsRng.gen_range(0..1_000_000);
    format!("{value:06}")
}

/// A code is exactly six ASCII digits.
#[must_use]
pub fn valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

pub struct CodeIssuer {
    store: Arc<SessionStore>,
    ttl: Duration,
    policy: SessionPolicy,
    demo_code: Option<String>,
}

impl CodeIssuer {
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            ttl: Duration::seconds(DEFAULT_CODE_TTL_SECONDS),
            policy: SessionPolicy::default(),
            demo_code: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Issue this fixed code for every login instead of a random one.
    #[must_use]
    pub fn with_demo_code(mut self, code: Option<String>) -> Self {
        self.demo_code = code;
        self
    }

    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session for `identifier` and return its id, code and expiry.
    /// The identifier is not validated here.
    pub fn issue(&self, identifier: &str) -> IssuedCode {
        if self.policy == SessionPolicy::Supersede {
            if let Some(previous) = self.store.latest_for(identifier) {
                if self.store.delete(&previous.session_id) {
                    debug!(session_id = %previous.session_id, "superseded session");
                }
            }
        }

        let code = self
            .demo_code
            .clone()
            .unwrap_or_else(generate_code);
        let session = self.store.insert(identifier, &code, self.ttl);

        info!(session_id = %session.session_id, policy = %self.policy, "issued one-time code");

        IssuedCode {
            session_id: session.session_id,
            code,
            expires_at: session.expires_at,
        }
    }
}
