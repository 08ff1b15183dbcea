//! # Tessera (One-Time Code Login)
//!
//! `tessera` issues short-lived numeric one-time codes to phone numbers or
//! email addresses, exchanges a correct code for a signed bearer token, and
//! guards routes with that token.
//!
//! ## Sessions
//!
//! Every login creates an independent session holding a 6-digit code, a
//! creation time, an expiry and an attempt counter. Sessions are kept in
//! memory only; a restart forgets them along with every issued token.
//!
//! - **Attempts:** each submission against a live session counts, right or
//!   wrong. Hitting the cap deletes the session.
//! - **Single use:** a correct code deletes its session, so it cannot be
//!   replayed, even by concurrent requests.
//! - **Expiry:** checked on every read; background sweeps only reclaim memory.
//!
//! ## Tokens
//!
//! Tokens are HS256 JWS values carrying the user id, identifier and display
//! name. A token is accepted only while unexpired and present in the active
//! set, which logout removes it from.
//!
//! ## Testing aids
//!
//! A fixed demo code, a master bearer token and code exposure in responses
//! exist for automated tests. All three are off unless configured.

pub mod api;
pub mod cli;
pub mod clock;
pub mod directory;
pub mod otp;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
