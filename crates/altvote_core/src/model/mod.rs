//! Domain model for alternatives, votes, comments, callers and accounts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field validation next to the types it protects.
//!
//! # Invariants
//! - Every persisted record is identified by a stable UUID.
//! - `Alternative::score` is only changed by the vote ledger.

pub mod account;
pub mod alternative;
pub mod caller;
pub mod comment;
pub mod validation;
pub mod vote;
