//! Alternative catalogue and moderation use-cases.
//!
//! # Responsibility
//! - Submission with validation and duplicate detection.
//! - Approval-aware reads, owner/admin edits and deletion.
//! - Admin moderation and dashboard counters.
//!
//! # Invariants
//! - Non-admin callers never observe unapproved alternatives.
//! - Alternatives submitted by admins start approved.
//! - Edits never change `score`.

use crate::model::alternative::{Alternative, AlternativeId, AlternativePatch, NewAlternative};
use crate::model::caller::Caller;
use crate::model::validation::ValidationError;
use crate::repo::alternative_repo::{AlternativeListQuery, AlternativeRepository, ModerationStats};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

const LATEST_DEFAULT_LIMIT: u32 = 6;

/// Service error for alternative use-cases.
#[derive(Debug)]
pub enum AlternativeServiceError {
    /// Submission or edit failed field validation.
    Validation(ValidationError),
    /// A similar alternative already exists.
    Duplicate { existing: AlternativeId },
    /// Target alternative does not exist.
    NotFound(AlternativeId),
    /// Alternative exists but is awaiting approval.
    NotApproved(AlternativeId),
    /// Caller lacks permission for the operation.
    Forbidden(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for AlternativeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { existing } => {
                write!(f, "a similar alternative already exists: {existing}")
            }
            Self::NotFound(id) => write!(f, "alternative not found: {id}"),
            Self::NotApproved(id) => write!(f, "alternative not approved yet: {id}"),
            Self::Forbidden(action) => write!(f, "not allowed to {action}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent alternative state: {details}")
            }
        }
    }
}

impl Error for AlternativeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AlternativeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for AlternativeServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type AlternativeServiceResult<T> = Result<T, AlternativeServiceError>;

/// Alternative service facade over repository implementations.
pub struct AlternativeService<R: AlternativeRepository> {
    repo: R,
}

impl<R: AlternativeRepository> AlternativeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores a new submission.
    ///
    /// # Errors
    /// - `Validation` for malformed fields.
    /// - `Duplicate` when the title, or the replaced product within the
    ///   same category, is already taken.
    pub fn submit(
        &self,
        caller: &Caller,
        submission: NewAlternative,
    ) -> AlternativeServiceResult<Alternative> {
        let submission = submission.normalized();
        submission.validate()?;

        if let Some(existing) = self.repo.find_duplicate(
            &submission.title,
            &submission.replaces,
            &submission.category,
        )? {
            return Err(AlternativeServiceError::Duplicate {
                existing: existing.id,
            });
        }

        let alternative = Alternative::from_submission(submission, caller.user_id, caller.is_admin);
        let id = self.repo.create_alternative(&alternative)?;
        info!(
            "event=alternative_submit module=alternative status=ok alternative_id={id} approved={}",
            alternative.approved
        );
        self.read_back(id, "submitted alternative missing in read-back")
    }

    /// Gets one alternative, hiding unapproved entries from non-admins.
    pub fn get(
        &self,
        caller: Option<&Caller>,
        id: AlternativeId,
    ) -> AlternativeServiceResult<Alternative> {
        let alternative = self
            .repo
            .get_alternative(id)?
            .ok_or(AlternativeServiceError::NotFound(id))?;
        if !alternative.approved && !is_admin(caller) {
            return Err(AlternativeServiceError::NotApproved(id));
        }
        Ok(alternative)
    }

    /// Applies a partial edit. Only the submitter or an admin may edit;
    /// only an admin may change approval.
    pub fn update(
        &self,
        caller: &Caller,
        id: AlternativeId,
        patch: AlternativePatch,
    ) -> AlternativeServiceResult<Alternative> {
        let mut alternative = self
            .repo
            .get_alternative(id)?
            .ok_or(AlternativeServiceError::NotFound(id))?;
        if !caller.can_manage(alternative.submitter_id) {
            return Err(AlternativeServiceError::Forbidden("edit this alternative"));
        }

        alternative.apply_patch(patch, caller.is_admin);
        self.repo.update_alternative(&alternative)?;
        self.read_back(id, "updated alternative missing in read-back")
    }

    /// Deletes an alternative with its votes and comments.
    pub fn delete(&self, caller: &Caller, id: AlternativeId) -> AlternativeServiceResult<()> {
        let alternative = self
            .repo
            .get_alternative(id)?
            .ok_or(AlternativeServiceError::NotFound(id))?;
        if !caller.can_manage(alternative.submitter_id) {
            return Err(AlternativeServiceError::Forbidden("delete this alternative"));
        }

        self.repo.delete_alternative(id)?;
        info!("event=alternative_delete module=alternative status=ok alternative_id={id}");
        Ok(())
    }

    /// Lists alternatives. Non-admin callers are restricted to approved ones.
    pub fn list(
        &self,
        caller: Option<&Caller>,
        query: &AlternativeListQuery,
    ) -> AlternativeServiceResult<Vec<Alternative>> {
        let mut effective = query.clone();
        if !is_admin(caller) {
            effective.approved = Some(true);
        }
        Ok(self.repo.list_alternatives(&effective)?)
    }

    /// Newest approved alternatives.
    pub fn latest(&self, limit: Option<u32>) -> AlternativeServiceResult<Vec<Alternative>> {
        let query = AlternativeListQuery {
            approved: Some(true),
            limit: Some(limit.filter(|value| *value > 0).unwrap_or(LATEST_DEFAULT_LIMIT)),
            ..AlternativeListQuery::default()
        };
        Ok(self.repo.list_alternatives(&query)?)
    }

    /// Looks up an existing alternative similar to a draft submission.
    ///
    /// Matches titles containing `title`, or, when both `replaces` and
    /// `category` are given, entries replacing a similar product in that
    /// category.
    pub fn check_exists(
        &self,
        title: &str,
        replaces: Option<&str>,
        category: Option<&str>,
    ) -> AlternativeServiceResult<Option<Alternative>> {
        let replaces_in_category = replaces.zip(category);
        Ok(self.repo.find_similar(title, replaces_in_category)?)
    }

    /// Approves or rejects a submission. Admin only.
    pub fn moderate(
        &self,
        caller: &Caller,
        id: AlternativeId,
        approved: bool,
    ) -> AlternativeServiceResult<Alternative> {
        if !caller.is_admin {
            return Err(AlternativeServiceError::Forbidden("moderate alternatives"));
        }

        self.repo.set_approved(id, approved)?;
        info!(
            "event=alternative_moderate module=alternative status=ok alternative_id={id} approved={approved}"
        );
        self.read_back(id, "moderated alternative missing in read-back")
    }

    /// Dashboard counters. Admin only.
    pub fn dashboard_stats(&self, caller: &Caller) -> AlternativeServiceResult<ModerationStats> {
        if !caller.is_admin {
            return Err(AlternativeServiceError::Forbidden("view moderation stats"));
        }
        Ok(self.repo.moderation_stats()?)
    }

    fn read_back(
        &self,
        id: AlternativeId,
        details: &'static str,
    ) -> AlternativeServiceResult<Alternative> {
        self.repo
            .get_alternative(id)?
            .ok_or(AlternativeServiceError::InconsistentState(details))
    }
}

fn is_admin(caller: Option<&Caller>) -> bool {
    caller.is_some_and(|caller| caller.is_admin)
}
