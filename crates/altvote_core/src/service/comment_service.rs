//! Comment use-case service.

use crate::model::alternative::AlternativeId;
use crate::model::caller::Caller;
use crate::model::comment::Comment;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

/// Comment service facade over repository implementations.
pub struct CommentService<R: CommentRepository> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a trimmed comment to an existing alternative.
    ///
    /// Returns `RepoError::Validation` for content shorter than 3 chars and
    /// `RepoError::NotFound` for an unknown alternative.
    pub fn add_comment(
        &self,
        caller: &Caller,
        alternative_id: AlternativeId,
        content: &str,
    ) -> RepoResult<Comment> {
        let comment = Comment::new(alternative_id, caller.user_id, content);
        let id = self.repo.add_comment(&comment)?;
        info!(
            "event=comment_add module=comment status=ok alternative_id={alternative_id} comment_id={id}"
        );
        self.repo.get_comment(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("comment {id} missing in read-back"))
        })
    }

    /// Lists comments for an alternative, newest first.
    pub fn list_comments(&self, alternative_id: AlternativeId) -> RepoResult<Vec<Comment>> {
        self.repo.list_comments(alternative_id)
    }
}
