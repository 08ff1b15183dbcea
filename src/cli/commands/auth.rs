use crate::api::MAX_TTL_SECONDS;
use crate::otp::{SessionPolicy, issuer::valid_code};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::ValueParser};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_MASTER_TOKEN: &str = "master-token";
pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_OTP_MAX_ATTEMPTS: &str = "otp-max-attempts";
pub const ARG_SESSION_POLICY: &str = "session-policy";
pub const ARG_DEMO_CODE: &str = "demo-code";
pub const ARG_EXPOSE_CODES: &str = "expose-codes";
pub const ARG_SESSION_SWEEP_SECONDS: &str = "session-sweep-seconds";
pub const ARG_TOKEN_SWEEP_SECONDS: &str = "token-sweep-seconds";
pub const ARG_CORS_ORIGIN: &str = "cors-origin";

#[derive(Debug)]
pub struct Options {
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

impl Options {
    /// Read auth settings from validated matches.
    ///
    /// # Errors
    /// Returns an error if the token secret is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --token-secret")?;

        Ok(Self {
            token_secret: SecretString::from(token_secret),
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(86_400),
            master_token: matches
                .get_one::<String>(ARG_MASTER_TOKEN)
                .filter(|token| !token.is_empty())
                .cloned()
                .map(SecretString::from),
            otp_ttl_seconds: matches
                .get_one::<i64>(ARG_OTP_TTL_SECONDS)
                .copied()
                .unwrap_or(300),
            otp_max_attempts: matches
                .get_one::<u32>(ARG_OTP_MAX_ATTEMPTS)
                .copied()
                .unwrap_or(3),
            session_policy: matches
                .get_one::<SessionPolicy>(ARG_SESSION_POLICY)
                .copied()
                .unwrap_or_default(),
            demo_code: matches.get_one::<String>(ARG_DEMO_CODE).cloned(),
            expose_codes: matches.get_flag(ARG_EXPOSE_CODES),
            session_sweep_seconds: matches
                .get_one::<u64>(ARG_SESSION_SWEEP_SECONDS)
                .copied()
                .unwrap_or(60),
            token_sweep_seconds: matches
                .get_one::<u64>(ARG_TOKEN_SWEEP_SECONDS)
                .copied()
                .unwrap_or(3600),
            cors_origin: matches.get_one::<String>(ARG_CORS_ORIGIN).cloned(),
        })
    }
}

fn validator_demo_code() -> ValueParser {
    ValueParser::from(|code: &str| -> std::result::Result<String, String> {
        if valid_code(code) {
            Ok(code.to_string())
        } else {
            Err("demo code must be exactly 6 digits".to_string())
        }
    })
}

fn validator_session_policy() -> ValueParser {
    ValueParser::from(|policy: &str| policy.parse::<SessionPolicy>())
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    let command = with_otp_args(command);
    let command = with_testing_aid_args(command);
    with_server_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("HMAC secret used to sign access tokens")
                .env("TESSERA_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Access token lifetime in seconds")
                .env("TESSERA_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TTL_SECONDS)),
        )
}

fn with_otp_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long(ARG_OTP_TTL_SECONDS)
                .help("One-time code lifetime in seconds")
                .env("TESSERA_OTP_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_OTP_MAX_ATTEMPTS)
                .long(ARG_OTP_MAX_ATTEMPTS)
                .help("Verification attempts allowed per session")
                .env("TESSERA_OTP_MAX_ATTEMPTS")
                .default_value("3")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_SESSION_POLICY)
                .long(ARG_SESSION_POLICY)
                .help("What a new login does to earlier live sessions: concurrent or supersede")
                .env("TESSERA_SESSION_POLICY")
                .default_value("concurrent")
                .value_parser(validator_session_policy()),
        )
}

fn with_testing_aid_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DEMO_CODE)
                .long(ARG_DEMO_CODE)
                .help("Issue this fixed 6-digit code for every login (testing only)")
                .env("TESSERA_DEMO_CODE")
                .value_parser(validator_demo_code()),
        )
        .arg(
            Arg::new(ARG_MASTER_TOKEN)
                .long(ARG_MASTER_TOKEN)
                .help("Token accepted as the master identity (testing only)")
                .env("TESSERA_MASTER_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_EXPOSE_CODES)
                .long(ARG_EXPOSE_CODES)
                .help("Return issued codes in login responses and /api/otp/latest (testing only)")
                .env("TESSERA_EXPOSE_CODES")
                .action(ArgAction::SetTrue),
        )
}

fn with_server_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SWEEP_SECONDS)
                .long(ARG_SESSION_SWEEP_SECONDS)
                .help("Interval between expired session sweeps")
                .env("TESSERA_SESSION_SWEEP_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_TOKEN_SWEEP_SECONDS)
                .long(ARG_TOKEN_SWEEP_SECONDS)
                .help("Interval between expired token sweeps")
                .env("TESSERA_TOKEN_SWEEP_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long(ARG_CORS_ORIGIN)
                .help("Allowed CORS origin, any origin when unset")
                .env("TESSERA_CORS_ORIGIN"),
        )
}
