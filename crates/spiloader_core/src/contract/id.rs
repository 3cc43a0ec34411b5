//! Contract and provider identifiers.
//!
//! # Invariants
//! - Identifiers are dotted binary names: segments start with a letter, `_`
//!   or `$`, continue with letters, digits, `_` or `$`.
//! - A valid contract id never contains a path separator, so it can be joined
//!   onto a root directory as a plain file name.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use thiserror::Error;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_$][\p{L}\p{N}_$]*(?:\.[\p{L}_$][\p{L}\p{N}_$]*)*$")
        .expect("identifier pattern is a valid regex")
});

/// Returns whether `value` is a well-formed dotted identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(value)
}

/// Identifier validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier must not be empty")]
    Empty,
    #[error("identifier contains whitespace: `{0}`")]
    ContainsWhitespace(String),
    #[error("identifier is not a dotted binary name: `{0}`")]
    Illegal(String),
}

fn validate(value: &str) -> Result<String, IdentifierError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(IdentifierError::ContainsWhitespace(trimmed.to_string()));
    }
    if !is_valid_identifier(trimmed) {
        return Err(IdentifierError::Illegal(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Fully-qualified contract identifier, e.g. `example.Service`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractId(String);

impl ContractId {
    /// Parses and validates one contract identifier (surrounding whitespace is trimmed).
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        validate(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContractId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fully-qualified provider identifier, e.g. `impl.SomeImpl`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    /// Parses and validates one provider identifier (surrounding whitespace is trimmed).
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        validate(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
