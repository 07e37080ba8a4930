//! Alternative (votable item) domain model.
//!
//! # Responsibility
//! - Define the submitted "alternative" record and its edit inputs.
//! - Normalize and validate submission fields.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `score` equals the signed sum of the alternative's live votes; it is
//!   written only by the vote ledger, never by edits.
//! - Text fields are stored trimmed.

use crate::model::caller::UserId;
use crate::model::validation::{require_len, require_website, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an alternative.
pub type AlternativeId = Uuid;

const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 100;
const TEXT_MIN_CHARS: usize = 10;

/// Canonical record of a submitted alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: AlternativeId,
    /// Product name of the alternative.
    pub title: String,
    /// Mainstream product this alternative replaces.
    pub replaces: String,
    pub description: String,
    pub reasons: String,
    pub benefits: String,
    pub website: Option<String>,
    pub category: String,
    /// Net vote score, maintained by the vote ledger.
    pub score: i64,
    /// Only approved alternatives are visible to non-admin callers.
    pub approved: bool,
    pub submitter_id: UserId,
    /// Epoch milliseconds; `0` until persisted.
    pub created_at: i64,
    /// Epoch milliseconds; `0` until persisted.
    pub updated_at: i64,
}

impl Alternative {
    /// Builds an unsaved alternative from a validated submission.
    pub fn from_submission(submission: NewAlternative, submitter_id: UserId, approved: bool) -> Self {
        let submission = submission.normalized();
        Self {
            id: Uuid::new_v4(),
            title: submission.title,
            replaces: submission.replaces,
            description: submission.description,
            reasons: submission.reasons,
            benefits: submission.benefits,
            website: submission.website,
            category: submission.category,
            score: 0,
            approved,
            submitter_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Validates stored text fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.title,
            &self.replaces,
            &self.description,
            &self.reasons,
            &self.benefits,
            self.website.as_deref(),
            &self.category,
        )
    }

    /// Applies present patch fields; `approved` only when `allow_approval`.
    pub fn apply_patch(&mut self, patch: AlternativePatch, allow_approval: bool) {
        let patch = patch.normalized();
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(replaces) = patch.replaces {
            self.replaces = replaces;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(reasons) = patch.reasons {
            self.reasons = reasons;
        }
        if let Some(benefits) = patch.benefits {
            self.benefits = benefits;
        }
        if let Some(website) = patch.website {
            self.website = (!website.is_empty()).then_some(website);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if allow_approval {
            if let Some(approved) = patch.approved {
                self.approved = approved;
            }
        }
    }
}

/// Submission input for a new alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlternative {
    pub title: String,
    pub replaces: String,
    pub description: String,
    pub reasons: String,
    pub benefits: String,
    #[serde(default)]
    pub website: Option<String>,
    pub category: String,
}

impl NewAlternative {
    /// Trims all fields; an empty website becomes `None`.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            replaces: self.replaces.trim().to_string(),
            description: self.description.trim().to_string(),
            reasons: self.reasons.trim().to_string(),
            benefits: self.benefits.trim().to_string(),
            website: normalize_optional(self.website),
            category: self.category.trim().to_string(),
        }
    }

    /// Validates the normalized form of this submission.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let normalized = self.clone().normalized();
        validate_fields(
            &normalized.title,
            &normalized.replaces,
            &normalized.description,
            &normalized.reasons,
            &normalized.benefits,
            normalized.website.as_deref(),
            &normalized.category,
        )
    }
}

/// Partial edit of an alternative. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativePatch {
    pub title: Option<String>,
    pub replaces: Option<String>,
    pub description: Option<String>,
    pub reasons: Option<String>,
    pub benefits: Option<String>,
    /// `Some("")` (or blank) clears the website.
    pub website: Option<String>,
    pub category: Option<String>,
    pub approved: Option<bool>,
}

impl AlternativePatch {
    /// Trims present fields. Blank values count as absent, except for
    /// `website`, where blank means "remove".
    pub fn normalized(self) -> Self {
        Self {
            title: normalize_optional(self.title),
            replaces: normalize_optional(self.replaces),
            description: normalize_optional(self.description),
            reasons: normalize_optional(self.reasons),
            benefits: normalize_optional(self.benefits),
            website: self.website.map(|website| website.trim().to_string()),
            category: normalize_optional(self.category),
            approved: self.approved,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn validate_fields(
    title: &str,
    replaces: &str,
    description: &str,
    reasons: &str,
    benefits: &str,
    website: Option<&str>,
    category: &str,
) -> Result<(), ValidationError> {
    require_len("title", title, TITLE_MIN_CHARS, Some(TITLE_MAX_CHARS))?;
    require_len("replaces", replaces, TITLE_MIN_CHARS, Some(TITLE_MAX_CHARS))?;
    require_len("description", description, TEXT_MIN_CHARS, None)?;
    require_len("reasons", reasons, TEXT_MIN_CHARS, None)?;
    require_len("benefits", benefits, TEXT_MIN_CHARS, None)?;
    require_len("category", category, 1, None)?;
    if let Some(website) = website {
        require_website(website)?;
    }
    Ok(())
}
