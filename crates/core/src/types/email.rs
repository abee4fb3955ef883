//! Account email addresses.
//!
//! Addresses are kept as entered (trimmed) and compared in normalized form:
//! trimmed and lowercased. Documents written before validation existed can
//! hold addresses that would not parse today, so deserialization does not
//! validate and lookups go through [`normalize`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected by [`Email::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email must contain exactly one @ symbol")]
    MultipleAtSymbols,
    #[error("email cannot contain whitespace")]
    ContainsWhitespace,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// A validated email address.
///
/// One `@` separating a non-empty local part from a non-empty domain, at
/// most 254 characters, no inner whitespace. This is a sanity check for
/// form input, not RFC 5322.
///
/// ```
/// use hembit_core::Email;
///
/// let email = Email::parse(" Asha@Hembit.in ").unwrap();
/// assert_eq!(email.as_str(), "Asha@Hembit.in");
/// assert_eq!(email.normalized(), "asha@hembit.in");
///
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("a@b@c").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from form input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] naming the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::MultipleAtSymbols);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lookup form: trimmed and lowercased.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize(&self.0)
    }

    /// Case-insensitive comparison against a raw stored address.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        normalize(&self.0) == normalize(other)
    }
}

/// Trim and lowercase an address without validating it.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_shapes() {
        for valid in [
            "user@example.com",
            "first.last+orders@shop.co.in",
            "a@b.c",
            "  padded@example.com \n",
        ] {
            assert!(Email::parse(valid).is_ok(), "{valid} should parse");
        }
    }

    #[test]
    fn test_parse_rejections() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        let cases = [
            ("", EmailError::Empty),
            ("   ", EmailError::Empty),
            (too_long.as_str(), EmailError::TooLong { max: 254 }),
            ("no-at-symbol", EmailError::MissingAtSymbol),
            ("a@b@c.com", EmailError::MultipleAtSymbols),
            ("first last@example.com", EmailError::ContainsWhitespace),
            ("@example.com", EmailError::EmptyLocalPart),
            ("user@", EmailError::EmptyDomain),
        ];
        for (input, expected) in cases {
            assert_eq!(Email::parse(input).unwrap_err(), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_parse_keeps_case_but_trims() {
        let email = Email::parse("  Asha@Hembit.in ").unwrap();
        assert_eq!(email.as_str(), "Asha@Hembit.in");
        assert_eq!(email.to_string(), "Asha@Hembit.in");
    }

    #[test]
    fn test_matches_ignores_case_and_padding() {
        let email = Email::parse("User@Example.com").unwrap();
        assert!(email.matches(" user@example.COM"));
        assert!(!email.matches("other@example.com"));
        assert_eq!(email.normalized(), "user@example.com");
    }

    #[test]
    fn test_deserialize_does_not_validate() {
        // Legacy documents may hold addresses that no longer parse
        let email: Email = serde_json::from_str("\"legacy address\"").unwrap();
        assert_eq!(email.as_str(), "legacy address");
        assert!(email.matches("LEGACY ADDRESS"));
    }
}
