//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply caller permissions; repositories stay permission-agnostic.

pub mod account_service;
pub mod alternative_service;
pub mod comment_service;
pub mod vote_service;
