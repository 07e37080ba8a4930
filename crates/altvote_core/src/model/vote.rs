//! Vote ledger model and per-pair transition rules.
//!
//! # Responsibility
//! - Define the closed `VoteDirection` type parsed at the system edge.
//! - Decide, for one `(user, alternative)` pair, which ledger mutation and
//!   score delta a requested direction implies.
//!
//! # Invariants
//! - At most one live `Vote` exists per `(user_id, alternative_id)`.
//! - A vote contributes `+1` (up) or `-1` (down) to the alternative score.
//! - `plan_vote` never produces a delta outside `{-2, -1, +1, +2}`.

use crate::model::alternative::AlternativeId;
use crate::model::caller::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Polarity of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Signed contribution of one vote in this direction to the score.
    pub fn contribution(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl Display for VoteDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction text that is neither `up` nor `down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDirection(pub String);

impl Display for InvalidDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid vote direction `{}`; expected up|down", self.0)
    }
}

impl Error for InvalidDirection {}

impl FromStr for VoteDirection {
    type Err = InvalidDirection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(InvalidDirection(other.to_string())),
        }
    }
}

/// One user's live vote on one alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: UserId,
    pub alternative_id: AlternativeId,
    pub direction: VoteDirection,
    /// Epoch milliseconds of the first vote for this pair.
    pub created_at: i64,
    /// Epoch milliseconds of the last flip.
    pub updated_at: i64,
}

/// Ledger mutation applied by one vote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteAction {
    /// No prior vote; a ledger row was inserted.
    Created,
    /// Same direction repeated; the ledger row was deleted.
    Retracted,
    /// Opposite direction; the ledger row was updated in place.
    Flipped,
}

impl VoteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Retracted => "retracted",
            Self::Flipped => "flipped",
        }
    }
}

/// Outcome of applying a requested direction to a pair's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub action: VoteAction,
    /// Amount to add to the alternative score.
    pub score_delta: i64,
    /// Direction stored for the pair afterwards; `None` after retraction.
    pub resulting: Option<VoteDirection>,
}

/// Computes the transition from `existing` for a `requested` direction.
///
/// Each call depends only on the pair's current vote, never on its history.
pub fn plan_vote(existing: Option<VoteDirection>, requested: VoteDirection) -> VoteTransition {
    match existing {
        None => VoteTransition {
            action: VoteAction::Created,
            score_delta: requested.contribution(),
            resulting: Some(requested),
        },
        Some(current) if current == requested => VoteTransition {
            action: VoteAction::Retracted,
            score_delta: -current.contribution(),
            resulting: None,
        },
        Some(current) => VoteTransition {
            action: VoteAction::Flipped,
            score_delta: requested.contribution() - current.contribution(),
            resulting: Some(requested),
        },
    }
}

/// Up/down counts derived from ledger rows for one alternative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
}

impl VoteTally {
    /// Score implied by the ledger: `upvotes - downvotes`.
    pub fn net(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}
