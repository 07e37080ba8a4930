//! Comment domain model.

use crate::model::alternative::AlternativeId;
use crate::model::caller::UserId;
use crate::model::validation::{require_len, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CommentId = Uuid;

const CONTENT_MIN_CHARS: usize = 3;

/// User comment attached to one alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub alternative_id: AlternativeId,
    pub author_id: UserId,
    /// Trimmed comment body.
    pub content: String,
    /// Epoch milliseconds; `0` until persisted.
    pub created_at: i64,
}

impl Comment {
    /// Builds a new comment with a generated ID and trimmed content.
    pub fn new(alternative_id: AlternativeId, author_id: UserId, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            alternative_id,
            author_id,
            content: content.trim().to_string(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_len("content", &self.content, CONTENT_MIN_CHARS, None)
    }
}
