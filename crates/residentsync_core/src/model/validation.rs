//! Shared field validation for model types.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Validation errors raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// External identifier is empty after trimming.
    EmptyExternalId(&'static str),
    /// External identifier carries leading or trailing whitespace.
    PaddedExternalId(&'static str),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyExternalId(field) => write!(f, "{field} must not be empty"),
            Self::PaddedExternalId(field) => {
                write!(f, "{field} must not have surrounding whitespace")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_external_id(
    field: &'static str,
    value: &str,
) -> Result<(), ModelValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::EmptyExternalId(field));
    }
    if trimmed.len() != value.len() {
        return Err(ModelValidationError::PaddedExternalId(field));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ModelValidationError> {
    if !EMAIL_RE.is_match(value) {
        return Err(ModelValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}
