//! Registered user account.
//!
//! # Responsibility
//! - Describe the profile the identity provider registers on sign-up.
//! - Normalize and validate username and email.
//!
//! # Invariants
//! - `id` equals the identity provider's user id, so a [`Caller`] and its
//!   account share one key.
//! - Usernames and emails are unique, case-insensitively.
//! - Credentials are never stored here.
//!
//! [`Caller`]: crate::model::caller::Caller

use crate::model::caller::UserId;
use crate::model::validation::{require_email, require_len, ValidationError};
use serde::{Deserialize, Serialize};

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 30;

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    /// Stored lowercase.
    pub email: String,
    pub is_admin: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl NewUserAccount {
    /// Trims both fields and lowercases the email.
    pub fn normalized(self) -> Self {
        Self {
            id: self.id,
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_len(
            "username",
            &self.username,
            USERNAME_MIN_CHARS,
            Some(USERNAME_MAX_CHARS),
        )?;
        require_len("email", &self.email, 1, None)?;
        require_email(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::NewUserAccount;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn registration_is_normalized_before_validation() {
        let input = NewUserAccount {
            id: Uuid::new_v4(),
            username: "  ada  ".to_string(),
            email: " Ada@Example.ORG ".to_string(),
        }
        .normalized();
        assert_eq!(input.username, "ada");
        assert_eq!(input.email, "ada@example.org");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn short_username_and_bad_email_are_rejected() {
        let id = Uuid::new_v4();
        let short = NewUserAccount {
            id,
            username: "al".to_string(),
            email: "al@example.org".to_string(),
        };
        assert!(matches!(
            short.validate(),
            Err(ValidationError::TooShort {
                field: "username",
                ..
            })
        ));

        let bad_email = NewUserAccount {
            id,
            username: "alan".to_string(),
            email: "alan.example.org".to_string(),
        };
        assert!(matches!(
            bad_email.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }
}
