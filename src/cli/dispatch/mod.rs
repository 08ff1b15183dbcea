//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, auth};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(3000);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        token_secret: auth_opts.token_secret,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        master_token: auth_opts.master_token,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        otp_max_attempts: auth_opts.otp_max_attempts,
        session_policy: auth_opts.session_policy,
        demo_code: auth_opts.demo_code,
        expose_codes: auth_opts.expose_codes,
        session_sweep_seconds: auth_opts.session_sweep_seconds,
        token_sweep_seconds: auth_opts.token_sweep_seconds,
        cors_origin: auth_opts.cors_origin,
    }))
}
