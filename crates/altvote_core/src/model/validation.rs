//! Field validation shared by submission, comment and account models.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WEBSITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid website regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Rejected user input, reported per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty after trimming.
    Empty { field: &'static str },
    /// Field has fewer characters than required.
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
    /// Field has more characters than allowed.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Website is not an absolute http(s) URL.
    InvalidWebsite(String),
    /// Email is not of the form `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "`{field}` is required"),
            Self::TooShort { field, min, actual } => write!(
                f,
                "`{field}` must be at least {min} characters, got {actual}"
            ),
            Self::TooLong { field, max, actual } => write!(
                f,
                "`{field}` must be at most {max} characters, got {actual}"
            ),
            Self::InvalidWebsite(value) => write!(f, "invalid website url `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: Option<usize>,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual == 0 {
        return Err(ValidationError::Empty { field });
    }
    if actual < min {
        return Err(ValidationError::TooShort { field, min, actual });
    }
    if let Some(max) = max {
        if actual > max {
            return Err(ValidationError::TooLong { field, max, actual });
        }
    }
    Ok(())
}

pub(crate) fn require_website(value: &str) -> Result<(), ValidationError> {
    if WEBSITE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidWebsite(value.to_string()))
    }
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}
