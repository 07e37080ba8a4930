//! Core domain logic for the alternatives platform.
//!
//! Owns the vote ledger and its score invariant, the alternative catalogue,
//! moderation, comments and the account registry. Callers arrive already
//! authenticated as a [`Caller`]; transport and credentials live outside
//! this crate.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingConfig};
pub use model::account::{NewUserAccount, UserAccount};
pub use model::alternative::{Alternative, AlternativeId, AlternativePatch, NewAlternative};
pub use model::caller::{Caller, UserId};
pub use model::comment::{Comment, CommentId};
pub use model::validation::ValidationError;
pub use model::vote::{Vote, VoteAction, VoteDirection, VoteTally};
pub use repo::alternative_repo::{
    AlternativeListQuery, AlternativeRepository, ModerationStats, SqliteAlternativeRepository,
};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::user_repo::{
    AdminGuard, SqliteUserRepository, UserListQuery, UserPage, UserRepository,
};
pub use repo::vote_repo::{SqliteVoteLedger, VoteLedger, VoteReceipt};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountService, AccountServiceError};
pub use service::alternative_service::{AlternativeService, AlternativeServiceError};
pub use service::comment_service::CommentService;
pub use service::vote_service::{VoteError, VoteResult, VoteService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
