//! Identifier validation for login requests.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{3}[)]?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$").ok()
});

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum IdentifierKind {
    Phone,
    Email,
}

impl IdentifierKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

/// Phone check ignores whitespace anywhere in the input.
pub(super) fn valid_phone(identifier: &str) -> bool {
    let compact: String = identifier.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE
        .as_ref()
        .is_some_and(|regex| regex.is_match(&compact))
}

pub(super) fn valid_email(identifier: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|regex| regex.is_match(identifier))
}

/// Classify an already-trimmed identifier. Phone wins when both match.
pub(super) fn classify_identifier(identifier: &str) -> Option<IdentifierKind> {
    if valid_phone(identifier) {
        Some(IdentifierKind::Phone)
    } else if valid_email(identifier) {
        Some(IdentifierKind::Email)
    } else {
        None
    }
}

/// Split an `Authorization` header value into its bearer token.
///
/// Exactly two space-separated parts are accepted, `Bearer` first.
pub(super) fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_formats() {
        assert!(valid_phone("+12025550123"));
        assert!(valid_phone("202-555-0123"));
        assert!(valid_phone("(202) 555 0123"));
        assert!(valid_phone("202.555.012345"));
        assert!(!valid_phone("202-555-012"));
        assert!(!valid_phone("call me"));
    }

    #[test]
    fn email_formats() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("first.last+tag@sub.example.org"));
        assert!(!valid_email("user@example"));
        assert!(!valid_email("user example@mail.com"));
        assert!(!valid_email("@example.com"));
    }

    #[test]
    fn classify_prefers_phone() {
        assert_eq!(classify_identifier("+12025550123"), Some(IdentifierKind::Phone));
        assert_eq!(classify_identifier("user@example.com"), Some(IdentifierKind::Email));
        assert_eq!(classify_identifier("hello"), None);
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer abc"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer  abc"), None);
        assert_eq!(parse_bearer("Bearer a b"), None);
        assert_eq!(parse_bearer("Token abc"), None);
    }
}
