//! Vote ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Record each user's live vote per alternative.
//! - Keep `alternatives.score` equal to the signed sum of ledger rows.
//!
//! # Invariants
//! - The existing-vote read, the ledger write and the score write of one
//!   `cast_vote` run inside a single `BEGIN IMMEDIATE` transaction. SQLite
//!   admits one such writer per database, so concurrent casts on the same
//!   alternative are serialized and no score update is lost.
//! - Exactly one ledger row is inserted, updated or deleted per cast.
//! - A transaction that is dropped before `commit` rolls back both writes.
//! - `(user_id, alternative_id)` is the primary key of `votes`.

use crate::model::alternative::AlternativeId;
use crate::model::caller::UserId;
use crate::model::vote::{plan_vote, Vote, VoteAction, VoteDirection, VoteTally};
use crate::repo::alternative_repo::load_score;
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::Serialize;

/// Result of one committed vote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    pub alternative_id: AlternativeId,
    pub action: VoteAction,
    /// Caller's direction after the operation; `None` after retraction.
    pub direction: Option<VoteDirection>,
    /// Alternative score after the operation.
    pub score: i64,
}

/// Repository interface for the vote ledger.
pub trait VoteLedger {
    /// Applies one vote atomically and returns the committed score.
    ///
    /// Fails with `RepoError::NotFound` when the alternative is absent, in
    /// which case nothing is written.
    fn cast_vote(
        &mut self,
        user_id: UserId,
        alternative_id: AlternativeId,
        direction: VoteDirection,
    ) -> RepoResult<VoteReceipt>;
    /// Gets the live vote of one pair.
    fn get_vote(&self, user_id: UserId, alternative_id: AlternativeId)
        -> RepoResult<Option<Vote>>;
    /// Counts ledger rows per direction for one alternative.
    fn tally(&self, alternative_id: AlternativeId) -> RepoResult<VoteTally>;
    /// Recomputes the score from ledger rows and persists it atomically.
    fn reconcile_score(&mut self, alternative_id: AlternativeId) -> RepoResult<i64>;
}

/// SQLite-backed vote ledger.
///
/// Holds the connection mutably because every write opens a transaction.
/// Concurrent workers should each own a connection to the same file.
pub struct SqliteVoteLedger<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteVoteLedger<'conn> {
    /// Creates ledger from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["alternatives", "votes"])?;
        Ok(Self { conn })
    }
}

impl VoteLedger for SqliteVoteLedger<'_> {
    fn cast_vote(
        &mut self,
        user_id: UserId,
        alternative_id: AlternativeId,
        direction: VoteDirection,
    ) -> RepoResult<VoteReceipt> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_score(&tx, alternative_id)?.is_none() {
            return Err(RepoError::NotFound(alternative_id));
        }

        let user_text = user_id.to_string();
        let alternative_text = alternative_id.to_string();
        let existing = load_direction_in_tx(&tx, &user_text, &alternative_text)?;
        let transition = plan_vote(existing, direction);

        let changed = match transition.action {
            VoteAction::Created => tx.execute(
                "INSERT INTO votes (user_id, alternative_id, direction)
                 VALUES (?1, ?2, ?3);",
                params![user_text, alternative_text, direction.as_str()],
            )?,
            VoteAction::Retracted => tx.execute(
                "DELETE FROM votes
                 WHERE user_id = ?1
                   AND alternative_id = ?2;",
                params![user_text, alternative_text],
            )?,
            VoteAction::Flipped => tx.execute(
                "UPDATE votes
                 SET
                    direction = ?3,
                    updated_at = (CAST(unixepoch('now', 'subsec') * 1000 AS INTEGER))
                 WHERE user_id = ?1
                   AND alternative_id = ?2;",
                params![user_text, alternative_text, direction.as_str()],
            )?,
        };
        if changed != 1 {
            return Err(RepoError::InvalidData(format!(
                "vote {} touched {changed} ledger rows for alternative {alternative_id}",
                transition.action.as_str()
            )));
        }

        let score = add_to_score_in_tx(&tx, &alternative_text, transition.score_delta)?;
        tx.commit()?;

        Ok(VoteReceipt {
            alternative_id,
            action: transition.action,
            direction: transition.resulting,
            score,
        })
    }

    fn get_vote(
        &self,
        user_id: UserId,
        alternative_id: AlternativeId,
    ) -> RepoResult<Option<Vote>> {
        let row = self
            .conn
            .query_row(
                "SELECT direction, created_at, updated_at
                 FROM votes
                 WHERE user_id = ?1
                   AND alternative_id = ?2;",
                params![user_id.to_string(), alternative_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(direction, created_at, updated_at)| {
            Ok(Vote {
                user_id,
                alternative_id,
                direction: parse_direction(&direction)?,
                created_at,
                updated_at,
            })
        })
        .transpose()
    }

    fn tally(&self, alternative_id: AlternativeId) -> RepoResult<VoteTally> {
        if load_score(&*self.conn, alternative_id)?.is_none() {
            return Err(RepoError::NotFound(alternative_id));
        }
        tally_rows(&*self.conn, &alternative_id.to_string())
    }

    fn reconcile_score(&mut self, alternative_id: AlternativeId) -> RepoResult<i64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(stored) = load_score(&tx, alternative_id)? else {
            return Err(RepoError::NotFound(alternative_id));
        };

        let alternative_text = alternative_id.to_string();
        let derived = tally_rows(&tx, &alternative_text)?.net();
        if derived != stored {
            add_to_score_in_tx(&tx, &alternative_text, derived - stored)?;
        }
        tx.commit()?;
        Ok(derived)
    }
}

/// Lists every ledger row of one alternative, ordered by user id.
pub fn list_votes_for_alternative(
    conn: &Connection,
    alternative_id: AlternativeId,
) -> RepoResult<Vec<Vote>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, direction, created_at, updated_at
         FROM votes
         WHERE alternative_id = ?1
         ORDER BY user_id ASC;",
    )?;
    let mut rows = stmt.query([alternative_id.to_string()])?;
    let mut votes = Vec::new();
    while let Some(row) = rows.next()? {
        let user_text: String = row.get("user_id")?;
        let direction_text: String = row.get("direction")?;
        votes.push(Vote {
            user_id: parse_uuid(&user_text, "votes.user_id")?,
            alternative_id,
            direction: parse_direction(&direction_text)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        });
    }
    Ok(votes)
}

fn load_direction_in_tx(
    tx: &Transaction<'_>,
    user_id: &str,
    alternative_id: &str,
) -> RepoResult<Option<VoteDirection>> {
    let direction: Option<String> = tx
        .query_row(
            "SELECT direction
             FROM votes
             WHERE user_id = ?1
               AND alternative_id = ?2;",
            params![user_id, alternative_id],
            |row| row.get(0),
        )
        .optional()?;
    direction.as_deref().map(parse_direction).transpose()
}

fn add_to_score_in_tx(tx: &Transaction<'_>, alternative_id: &str, delta: i64) -> RepoResult<i64> {
    let score = tx.query_row(
        "UPDATE alternatives
         SET score = score + ?2
         WHERE id = ?1
         RETURNING score;",
        params![alternative_id, delta],
        |row| row.get(0),
    )?;
    Ok(score)
}

fn tally_rows(conn: &Connection, alternative_id: &str) -> RepoResult<VoteTally> {
    let (upvotes, downvotes): (i64, i64) = conn.query_row(
        "SELECT
            COALESCE(SUM(direction = 'up'), 0),
            COALESCE(SUM(direction = 'down'), 0)
         FROM votes
         WHERE alternative_id = ?1;",
        [alternative_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let to_count = |value: i64| {
        u64::try_from(value)
            .map_err(|_| RepoError::InvalidData(format!("negative vote count `{value}`")))
    };
    Ok(VoteTally {
        upvotes: to_count(upvotes)?,
        downvotes: to_count(downvotes)?,
    })
}

fn parse_direction(value: &str) -> RepoResult<VoteDirection> {
    value.parse().map_err(|_| {
        RepoError::InvalidData(format!("invalid vote direction `{value}` in votes.direction"))
    })
}
