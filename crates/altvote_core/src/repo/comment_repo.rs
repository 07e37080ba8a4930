//! Comment repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Comments always reference an existing alternative.
//! - Listing order is newest first: `created_at DESC, rowid DESC`.

use crate::model::alternative::AlternativeId;
use crate::model::comment::{Comment, CommentId};
use crate::repo::alternative_repo::load_score;
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    alternative_id,
    author_id,
    content,
    created_at
FROM comments";

/// Repository interface for comments.
pub trait CommentRepository {
    /// Persists a comment; fails with `NotFound` for an unknown alternative.
    fn add_comment(&self, comment: &Comment) -> RepoResult<CommentId>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    fn list_comments(&self, alternative_id: AlternativeId) -> RepoResult<Vec<Comment>>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["alternatives", "comments"])?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn add_comment(&self, comment: &Comment) -> RepoResult<CommentId> {
        comment.validate()?;
        if load_score(self.conn, comment.alternative_id)?.is_none() {
            return Err(RepoError::NotFound(comment.alternative_id));
        }

        self.conn.execute(
            "INSERT INTO comments (id, alternative_id, author_id, content)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.id.to_string(),
                comment.alternative_id.to_string(),
                comment.author_id.to_string(),
                comment.content.as_str(),
            ],
        )?;
        Ok(comment.id)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments(&self, alternative_id: AlternativeId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE alternative_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([alternative_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id_text: String = row.get("id")?;
    let alternative_text: String = row.get("alternative_id")?;
    let author_text: String = row.get("author_id")?;
    Ok(Comment {
        id: parse_uuid(&id_text, "comments.id")?,
        alternative_id: parse_uuid(&alternative_text, "comments.alternative_id")?,
        author_id: parse_uuid(&author_text, "comments.author_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}
