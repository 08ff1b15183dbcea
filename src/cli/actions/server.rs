use crate::{
    api::{self, AuthConfig},
    otp::SessionPolicy,
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub token_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub master_token: Option<SecretString>,
    pub otp_ttl_seconds: i64,
    pub otp_max_attempts: u32,
    pub session_policy: SessionPolicy,
    pub demo_code: Option<String>,
    pub expose_codes: bool,
    pub session_sweep_seconds: u64,
    pub token_sweep_seconds: u64,
    pub cors_origin: Option<String>,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.token_secret.clone())
            .with_token_ttl_seconds(self.token_ttl_seconds)
            .with_master_token(self.master_token.clone())
            .with_otp_ttl_seconds(self.otp_ttl_seconds)
            .with_otp_max_attempts(self.otp_max_attempts)
            .with_session_policy(self.session_policy)
            .with_demo_code(self.demo_code.clone())
            .with_expose_codes(self.expose_codes)
            .with_session_sweep_seconds(self.session_sweep_seconds)
            .with_token_sweep_seconds(self.token_sweep_seconds)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the CORS origin is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = args.auth_config();
    debug!(
        port = args.port,
        policy = %args.session_policy,
        "starting server"
    );

    api::new(args.port, auth_config, args.cors_origin).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            port: 3000,
            token_secret: SecretString::from("server-secret".to_string()),
            token_ttl_seconds: 120,
            master_token: Some(SecretString::from("qa-master".to_string())),
            otp_ttl_seconds: 30,
            otp_max_attempts: 5,
            session_policy: SessionPolicy::Supersede,
            demo_code: Some("654321".to_string()),
            expose_codes: true,
            session_sweep_seconds: 10,
            token_sweep_seconds: 20,
            cors_origin: None,
        }
    }

    #[test]
    fn auth_config_mirrors_args() {
        let config = args().auth_config();
        assert_eq!(config.token_ttl_seconds(), 120);
        assert!(config.master_token_enabled());
        assert_eq!(config.otp_ttl_seconds(), 30);
        assert_eq!(config.otp_max_attempts(), 5);
        assert_eq!(config.session_policy(), SessionPolicy::Supersede);
        assert_eq!(config.demo_code(), Some("654321"));
        assert!(config.expose_codes());
        assert_eq!(config.session_sweep_interval().as_secs(), 10);
        assert_eq!(config.token_sweep_interval().as_secs(), 20);
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", args());
        assert!(!rendered.contains("server-secret"));
        assert!(!rendered.contains("qa-master"));
    }
}
