//! Font slug parsing and validation
//!
//! A [`ResourceIdentifier`] is the URL-safe slug naming one downloadable font
//! (e.g. `satoshi`, `cabinet-grotesk`). It doubles as the directory and file
//! stem of the downloaded archive, so validation is strict: lowercase ASCII
//! letters, digits, and inner hyphens only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted slug length
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// Validated font slug
///
/// # Examples
///
/// ```
/// use fontshare_downloader::identifier::ResourceIdentifier;
///
/// let id = ResourceIdentifier::parse("clash-display").unwrap();
/// assert_eq!(id.as_str(), "clash-display");
///
/// let id = ResourceIdentifier::normalize("  Cabinet Grotesk ").unwrap();
/// assert_eq!(id.as_str(), "cabinet-grotesk");
///
/// assert!(ResourceIdentifier::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceIdentifier(String);

impl ResourceIdentifier {
    /// Parse an already-normalized slug
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is empty, too long, contains anything other
    /// than `[a-z0-9-]`, or starts/ends with a hyphen.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if s.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong(s.len()));
        }

        if let Some(ch) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(IdentifierError::InvalidCharacter {
                identifier: s.to_string(),
                ch,
            });
        }

        if s.starts_with('-') || s.ends_with('-') {
            return Err(IdentifierError::InvalidBoundary(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// Normalize a display name or loosely formatted slug, then parse it
    ///
    /// Trims whitespace, lowercases, and turns inner whitespace runs into a
    /// single hyphen, matching how catalog sources name fonts.
    pub fn normalize(raw: &str) -> Result<Self, IdentifierError> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        Self::parse(&normalized)
    }

    /// Borrow the slug
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned slug
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ResourceIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceIdentifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceIdentifier> for String {
    fn from(value: ResourceIdentifier) -> Self {
        value.0
    }
}

/// Errors that can occur during slug parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// Empty slug
    #[error("identifier cannot be empty")]
    Empty,

    /// Slug exceeds [`MAX_IDENTIFIER_LEN`]
    #[error("identifier is {0} characters long (max {MAX_IDENTIFIER_LEN})")]
    TooLong(usize),

    /// Character outside `[a-z0-9-]`
    #[error("identifier '{identifier}' contains invalid character '{ch}'")]
    InvalidCharacter {
        /// Offending input
        identifier: String,
        /// First invalid character
        ch: char,
    },

    /// Leading or trailing hyphen
    #[error("identifier '{0}' cannot start or end with '-'")]
    InvalidBoundary(String),
}
