//! Auth state and configuration.

use crate::{
    clock::{Clock, SystemClock},
    directory::{MemoryDirectory, UserDirectory},
    otp::{CodeIssuer, SessionPolicy, SessionStore, Verifier, issuer, store},
    token::{TokenAuthority, authority},
};
use chrono::Duration;
use secrecy::SecretString;
use std::sync::Arc;

const DEFAULT_SESSION_SWEEP_SECONDS: u64 = 60;
const DEFAULT_TOKEN_SWEEP_SECONDS: u64 = 60 * 60;

/// Upper bound for code and token lifetimes (one year).
pub const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    token_ttl_seconds: i64,
    master_token: Option<SecretString>,
    otp_ttl_seconds: i64,
    otp_max_attempts: u32,
    demo_code: Option<String>,
    session_policy: SessionPolicy,
    expose_codes: bool,
    session_sweep_seconds: u64,
    token_sweep_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_ttl_seconds: authority::DEFAULT_TOKEN_TTL_SECONDS,
            master_token: None,
            otp_ttl_seconds: issuer::DEFAULT_CODE_TTL_SECONDS,
            otp_max_attempts: store::DEFAULT_MAX_ATTEMPTS,
            demo_code: None,
            session_policy: SessionPolicy::default(),
            expose_codes: false,
            session_sweep_seconds: DEFAULT_SESSION_SWEEP_SECONDS,
            token_sweep_seconds: DEFAULT_TOKEN_SWEEP_SECONDS,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds.clamp(1, MAX_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_master_token(mut self, master_token: Option<SecretString>) -> Self {
        self.master_token = master_token;
        self
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds.clamp(1, MAX_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_otp_max_attempts(mut self, attempts: u32) -> Self {
        self.otp_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_demo_code(mut self, code: Option<String>) -> Self {
        self.demo_code = code;
        self
    }

    #[must_use]
    pub fn with_session_policy(mut self, policy: SessionPolicy) -> Self {
        self.session_policy = policy;
        self
    }

    #[must_use]
    pub fn with_expose_codes(mut self, expose: bool) -> Self {
        self.expose_codes = expose;
        self
    }

    #[must_use]
    pub fn with_session_sweep_seconds(mut self, seconds: u64) -> Self {
        self.session_sweep_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_token_sweep_seconds(mut self, seconds: u64) -> Self {
        self.token_sweep_seconds = seconds;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn master_token_enabled(&self) -> bool {
        self.master_token.is_some()
    }

    #[must_use]
    pub fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    #[must_use]
    pub fn otp_max_attempts(&self) -> u32 {
        self.otp_max_attempts
    }

    #[must_use]
    pub fn demo_code(&self) -> Option<&str> {
        self.demo_code.as_deref()
    }

    #[must_use]
    pub fn session_policy(&self) -> SessionPolicy {
        self.session_policy
    }

    /// Whether issued codes may be returned to clients and inspection routes.
    #[must_use]
    pub fn expose_codes(&self) -> bool {
        self.expose_codes
    }

    #[must_use]
    pub fn session_sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_sweep_seconds.max(1))
    }

    #[must_use]
    pub fn token_sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.token_sweep_seconds.max(1))
    }
}

/// Everything the auth handlers share, built once per process.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<SessionStore>,
    issuer: CodeIssuer,
    verifier: Verifier,
    tokens: TokenAuthority,
}

impl AuthState {
    /// Wire the state on the system clock and an in-memory directory.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let directory = Arc::new(MemoryDirectory::new(Arc::clone(&clock)));
        Self::with_parts(config, clock, directory)
    }

    #[must_use]
    pub fn with_parts(
        config: AuthConfig,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let store = Arc::new(SessionStore::with_max_attempts(
            Arc::clone(&clock),
            config.otp_max_attempts,
        ));
        let issuer = CodeIssuer::new(Arc::clone(&store))
            .with_ttl(Duration::seconds(config.otp_ttl_seconds))
            .with_policy(config.session_policy)
            .with_demo_code(config.demo_code.clone());
        let verifier = Verifier::new(Arc::clone(&store), directory);
        let tokens = TokenAuthority::new(config.token_secret.clone(), clock)
            .with_lifetime(Duration::seconds(config.token_ttl_seconds))
            .with_master_token(config.master_token.clone());

        Self {
            config,
            store,
            issuer,
            verifier,
            tokens,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn issuer(&self) -> &CodeIssuer {
        &self.issuer
    }

    #[must_use]
    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, AuthState, MAX_TTL_SECONDS};
    use crate::otp::SessionPolicy;
    use secrecy::{ExposeSecret, SecretString};
    use std::time::Duration;

    fn secret() -> SecretString {
        SecretString::from("state-test-secret".to_string())
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(secret());

        assert_eq!(config.token_ttl_seconds(), 86_400);
        assert_eq!(config.otp_ttl_seconds(), 300);
        assert_eq!(config.otp_max_attempts(), 3);
        assert_eq!(config.demo_code(), None);
        assert!(!config.master_token_enabled());
        assert!(!config.expose_codes());
        assert_eq!(config.session_policy(), SessionPolicy::Concurrent);
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.token_sweep_interval(), Duration::from_secs(3600));

        let config = config
            .with_token_ttl_seconds(120)
            .with_master_token(Some(SecretString::from("master".to_string())))
            .with_otp_ttl_seconds(30)
            .with_otp_max_attempts(5)
            .with_demo_code(Some("123456".to_string()))
            .with_session_policy(SessionPolicy::Supersede)
            .with_expose_codes(true)
            .with_session_sweep_seconds(0)
            .with_token_sweep_seconds(10);

        assert_eq!(config.token_ttl_seconds(), 120);
        assert!(config.master_token_enabled());
        assert_eq!(config.otp_ttl_seconds(), 30);
        assert_eq!(config.otp_max_attempts(), 5);
        assert_eq!(config.demo_code(), Some("123456"));
        assert_eq!(config.session_policy(), SessionPolicy::Supersede);
        assert!(config.expose_codes());
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.token_sweep_interval(), Duration::from_secs(10));
    }

    #[test]
    fn auth_config_debug_redacts_secrets() {
        let config = AuthConfig::new(secret())
            .with_master_token(Some(SecretString::from("letmein".to_string())));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("state-test-secret"));
        assert!(!rendered.contains("letmein"));
        assert_eq!(config.token_secret.expose_secret(), "state-test-secret");
    }

    #[test]
    fn auth_state_applies_config() {
        let config = AuthConfig::new(secret())
            .with_otp_max_attempts(7)
            .with_session_policy(SessionPolicy::Supersede)
            .with_otp_ttl_seconds(42);
        let state = AuthState::new(config);

        assert_eq!(state.sessions().max_attempts(), 7);
        assert_eq!(state.issuer().policy(), SessionPolicy::Supersede);
        assert_eq!(state.issuer().ttl(), chrono::Duration::seconds(42));
        assert_eq!(state.tokens().active_count(), 0);
    }

    #[test]
    fn lifetimes_are_clamped() {
        let config = AuthConfig::new(secret())
            .with_token_ttl_seconds(0)
            .with_otp_ttl_seconds(i64::MAX);
        assert_eq!(config.token_ttl_seconds(), 1);
        assert_eq!(config.otp_ttl_seconds(), MAX_TTL_SECONDS);

        let state = AuthState::new(config);
        assert_eq!(
            state.issuer().ttl(),
            chrono::Duration::seconds(MAX_TTL_SECONDS)
        );
    }
}
