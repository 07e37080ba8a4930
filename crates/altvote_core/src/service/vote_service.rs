//! Vote use-case service.
//!
//! # Responsibility
//! - Parse the textual direction at the system edge.
//! - Delegate the atomic ledger update and report the committed score.
//! - Translate repository failures into the vote error taxonomy.
//!
//! # Invariants
//! - An invalid direction is rejected before the ledger is touched.
//! - Errors are returned unchanged in kind and never retried here.

use crate::model::alternative::AlternativeId;
use crate::model::caller::UserId;
use crate::model::vote::{Vote, VoteAction, VoteDirection, VoteTally};
use crate::repo::vote_repo::{VoteLedger, VoteReceipt};
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Failure of a vote operation.
#[derive(Debug)]
pub enum VoteError {
    /// Referenced alternative does not exist.
    NotFound(AlternativeId),
    /// Direction text is not `up` or `down`.
    InvalidArgument(String),
    /// The atomic unit could not commit; nothing was written.
    StorageFailure(RepoError),
}

impl Display for VoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "alternative not found: {id}"),
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::StorageFailure(err) => write!(f, "vote storage failure: {err}"),
        }
    }
}

impl Error for VoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VoteError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::StorageFailure(other),
        }
    }
}

impl VoteError {
    /// Stable code used in log lines and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::StorageFailure(_) => "storage_failure",
        }
    }
}

/// Committed outcome of one vote, serialized as `{ "score": .. }` plus
/// transition details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteResult {
    pub score: i64,
    pub action: VoteAction,
    pub direction: Option<VoteDirection>,
}

impl From<VoteReceipt> for VoteResult {
    fn from(receipt: VoteReceipt) -> Self {
        Self {
            score: receipt.score,
            action: receipt.action,
            direction: receipt.direction,
        }
    }
}

/// Vote service facade over a ledger implementation.
pub struct VoteService<L: VoteLedger> {
    ledger: L,
}

impl<L: VoteLedger> VoteService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Casts a vote given the boundary's textual direction.
    ///
    /// # Errors
    /// - `InvalidArgument` for anything other than `up`/`down`.
    /// - `NotFound` for an unknown alternative.
    /// - `StorageFailure` when the transaction cannot commit.
    pub fn cast_vote(
        &mut self,
        user_id: UserId,
        alternative_id: AlternativeId,
        direction: &str,
    ) -> Result<VoteResult, VoteError> {
        let direction = direction.parse::<VoteDirection>().map_err(|err| {
            warn!(
                "event=vote_cast module=vote status=error alternative_id={alternative_id} error_code=invalid_argument"
            );
            VoteError::InvalidArgument(err.to_string())
        })?;
        self.cast(user_id, alternative_id, direction)
    }

    /// Casts a vote with an already-parsed direction.
    pub fn cast(
        &mut self,
        user_id: UserId,
        alternative_id: AlternativeId,
        direction: VoteDirection,
    ) -> Result<VoteResult, VoteError> {
        let started_at = Instant::now();
        match self.ledger.cast_vote(user_id, alternative_id, direction) {
            Ok(receipt) => {
                info!(
                    "event=vote_cast module=vote status=ok alternative_id={alternative_id} direction={direction} action={} score={} duration_ms={}",
                    receipt.action.as_str(),
                    receipt.score,
                    started_at.elapsed().as_millis()
                );
                Ok(receipt.into())
            }
            Err(err) => {
                let err = VoteError::from(err);
                warn!(
                    "event=vote_cast module=vote status=error alternative_id={alternative_id} direction={direction} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Returns the caller's live vote on an alternative, if any.
    pub fn current_vote(
        &self,
        user_id: UserId,
        alternative_id: AlternativeId,
    ) -> Result<Option<Vote>, VoteError> {
        Ok(self.ledger.get_vote(user_id, alternative_id)?)
    }

    /// Counts ledger rows per direction.
    pub fn tally(&self, alternative_id: AlternativeId) -> Result<VoteTally, VoteError> {
        Ok(self.ledger.tally(alternative_id)?)
    }

    /// Rewrites the stored score from the ledger and returns it.
    pub fn reconcile(&mut self, alternative_id: AlternativeId) -> Result<i64, VoteError> {
        let score = self.ledger.reconcile_score(alternative_id)?;
        info!(
            "event=vote_reconcile module=vote status=ok alternative_id={alternative_id} score={score}"
        );
        Ok(score)
    }
}
