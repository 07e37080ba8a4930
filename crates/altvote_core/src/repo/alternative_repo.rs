//! Alternative repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and query APIs over the `alternatives` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Alternative::validate()` before SQL mutations.
//! - No method here writes `score`; that column belongs to the vote ledger.
//! - Listing order is deterministic: `created_at DESC, rowid DESC`.

use crate::model::alternative::{Alternative, AlternativeId};
use crate::repo::schema::{bool_to_int, ensure_connection_ready, int_to_bool, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;

const ALTERNATIVE_SELECT_SQL: &str = "SELECT
    id,
    title,
    replaces,
    description,
    reasons,
    benefits,
    website,
    category,
    score,
    approved,
    submitter_id,
    created_at,
    updated_at
FROM alternatives";

const LIST_DEFAULT_LIMIT: u32 = 10;
const LIST_LIMIT_MAX: u32 = 50;
const DASHBOARD_LATEST_LIMIT: u32 = 5;

/// Query options for listing alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativeListQuery {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring of `title` or `replaces`.
    pub search: Option<String>,
    /// Approval filter; `None` returns both states.
    pub approved: Option<bool>,
    /// Maximum rows to return. Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
}

/// Counters and recent submissions shown on the moderation dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModerationStats {
    pub total_alternatives: u64,
    pub pending_alternatives: u64,
    pub total_users: u64,
    pub total_comments: u64,
    /// Five newest alternatives, approved or not.
    pub latest: Vec<Alternative>,
}

/// Repository interface for alternative persistence.
pub trait AlternativeRepository {
    fn create_alternative(&self, alternative: &Alternative) -> RepoResult<AlternativeId>;
    /// Rewrites editable fields; leaves `score` untouched.
    fn update_alternative(&self, alternative: &Alternative) -> RepoResult<()>;
    fn get_alternative(&self, id: AlternativeId) -> RepoResult<Option<Alternative>>;
    fn list_alternatives(&self, query: &AlternativeListQuery) -> RepoResult<Vec<Alternative>>;
    fn set_approved(&self, id: AlternativeId, approved: bool) -> RepoResult<()>;
    /// Hard-deletes the alternative together with its votes and comments.
    fn delete_alternative(&self, id: AlternativeId) -> RepoResult<()>;
    /// Exact, case-insensitive duplicate lookup used on submission: same
    /// title, or same replaced product within the same category.
    fn find_duplicate(
        &self,
        title: &str,
        replaces: &str,
        category: &str,
    ) -> RepoResult<Option<Alternative>>;
    /// Substring lookup used by the "does this exist yet" lookup.
    fn find_similar(
        &self,
        title: &str,
        replaces_in_category: Option<(&str, &str)>,
    ) -> RepoResult<Option<Alternative>>;
    fn moderation_stats(&self) -> RepoResult<ModerationStats>;
}

/// SQLite-backed alternative repository.
pub struct SqliteAlternativeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAlternativeRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["alternatives", "comments", "users"])?;
        Ok(Self { conn })
    }
}

impl AlternativeRepository for SqliteAlternativeRepository<'_> {
    fn create_alternative(&self, alternative: &Alternative) -> RepoResult<AlternativeId> {
        alternative.validate()?;

        self.conn.execute(
            "INSERT INTO alternatives (
                id,
                title,
                replaces,
                description,
                reasons,
                benefits,
                website,
                category,
                score,
                approved,
                submitter_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10);",
            params![
                alternative.id.to_string(),
                alternative.title.as_str(),
                alternative.replaces.as_str(),
                alternative.description.as_str(),
                alternative.reasons.as_str(),
                alternative.benefits.as_str(),
                alternative.website.as_deref(),
                alternative.category.as_str(),
                bool_to_int(alternative.approved),
                alternative.submitter_id.to_string(),
            ],
        )?;

        Ok(alternative.id)
    }

    fn update_alternative(&self, alternative: &Alternative) -> RepoResult<()> {
        alternative.validate()?;

        let changed = self.conn.execute(
            "UPDATE alternatives
             SET
                title = ?1,
                replaces = ?2,
                description = ?3,
                reasons = ?4,
                benefits = ?5,
                website = ?6,
                category = ?7,
                approved = ?8,
                updated_at = (CAST(unixepoch('now', 'subsec') * 1000 AS INTEGER))
             WHERE id = ?9;",
            params![
                alternative.title.as_str(),
                alternative.replaces.as_str(),
                alternative.description.as_str(),
                alternative.reasons.as_str(),
                alternative.benefits.as_str(),
                alternative.website.as_deref(),
                alternative.category.as_str(),
                bool_to_int(alternative.approved),
                alternative.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(alternative.id));
        }

        Ok(())
    }

    fn get_alternative(&self, id: AlternativeId) -> RepoResult<Option<Alternative>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALTERNATIVE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_alternative_row(row)?));
        }
        Ok(None)
    }

    fn list_alternatives(&self, query: &AlternativeListQuery) -> RepoResult<Vec<Alternative>> {
        let mut sql = format!("{ALTERNATIVE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category.as_deref() {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.to_string()));
        }

        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let pattern = like_pattern(search);
                sql.push_str(" AND (title LIKE ? ESCAPE '\\' OR replaces LIKE ? ESCAPE '\\')");
                bind_values.push(Value::Text(pattern.clone()));
                bind_values.push(Value::Text(pattern));
            }
        }

        if let Some(approved) = query.approved {
            sql.push_str(" AND approved = ?");
            bind_values.push(Value::Integer(bool_to_int(approved)));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut alternatives = Vec::new();
        while let Some(row) = rows.next()? {
            alternatives.push(parse_alternative_row(row)?);
        }

        Ok(alternatives)
    }

    fn set_approved(&self, id: AlternativeId, approved: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE alternatives
             SET
                approved = ?2,
                updated_at = (CAST(unixepoch('now', 'subsec') * 1000 AS INTEGER))
             WHERE id = ?1;",
            params![id.to_string(), bool_to_int(approved)],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_alternative(&self, id: AlternativeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM alternatives WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn find_duplicate(
        &self,
        title: &str,
        replaces: &str,
        category: &str,
    ) -> RepoResult<Option<Alternative>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ALTERNATIVE_SELECT_SQL}
             WHERE title = ?1 COLLATE NOCASE
                OR (replaces = ?2 COLLATE NOCASE AND category = ?3)
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![title.trim(), replaces.trim(), category.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_alternative_row(row)?));
        }
        Ok(None)
    }

    fn find_similar(
        &self,
        title: &str,
        replaces_in_category: Option<(&str, &str)>,
    ) -> RepoResult<Option<Alternative>> {
        let mut sql = format!("{ALTERNATIVE_SELECT_SQL} WHERE title LIKE ?1 ESCAPE '\\'");
        let mut bind_values = vec![Value::Text(like_pattern(title.trim()))];

        if let Some((replaces, category)) = replaces_in_category {
            sql.push_str(" OR (replaces LIKE ?2 ESCAPE '\\' AND category = ?3)");
            bind_values.push(Value::Text(like_pattern(replaces.trim())));
            bind_values.push(Value::Text(category.trim().to_string()));
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC LIMIT 1;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_alternative_row(row)?));
        }
        Ok(None)
    }

    fn moderation_stats(&self) -> RepoResult<ModerationStats> {
        let (total, pending): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(approved = 0), 0) FROM alternatives;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let comments: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments;", [], |row| row.get(0))?;
        let users: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        let latest = self.list_alternatives(&AlternativeListQuery {
            limit: Some(DASHBOARD_LATEST_LIMIT),
            ..AlternativeListQuery::default()
        })?;

        Ok(ModerationStats {
            total_alternatives: to_count(total)?,
            pending_alternatives: to_count(pending)?,
            total_users: to_count(users)?,
            total_comments: to_count(comments)?,
            latest,
        })
    }
}

/// Normalizes list limit according to the listing contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => LIST_DEFAULT_LIMIT,
        Some(value) => value.min(LIST_LIMIT_MAX),
    }
}

/// Loads the score of one alternative, if it exists.
pub(crate) fn load_score(conn: &Connection, id: AlternativeId) -> RepoResult<Option<i64>> {
    let score = conn
        .query_row(
            "SELECT score FROM alternatives WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(score)
}

pub(crate) fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub(crate) fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative count `{value}`")))
}

fn parse_alternative_row(row: &Row<'_>) -> RepoResult<Alternative> {
    let id_text: String = row.get("id")?;
    let submitter_text: String = row.get("submitter_id")?;

    let alternative = Alternative {
        id: parse_uuid(&id_text, "alternatives.id")?,
        title: row.get("title")?,
        replaces: row.get("replaces")?,
        description: row.get("description")?,
        reasons: row.get("reasons")?,
        benefits: row.get("benefits")?,
        website: row.get("website")?,
        category: row.get("category")?,
        score: row.get("score")?,
        approved: int_to_bool(row.get("approved")?, "alternatives.approved")?,
        submitter_id: parse_uuid(&submitter_text, "alternatives.submitter_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    Ok(alternative)
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, normalize_list_limit};

    #[test]
    fn list_limit_defaults_and_clamps() {
        assert_eq!(normalize_list_limit(None), 10);
        assert_eq!(normalize_list_limit(Some(0)), 10);
        assert_eq!(normalize_list_limit(Some(7)), 7);
        assert_eq!(normalize_list_limit(Some(500)), 50);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
