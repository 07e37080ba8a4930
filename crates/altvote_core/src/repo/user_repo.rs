//! User account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Register, list, promote/demote and delete user accounts.
//!
//! # Invariants
//! - The first registered account is an admin; the check and the insert
//!   are one statement.
//! - Admin demotion and account deletion never leave zero admins once an
//!   admin exists. The admin count is read inside the same immediate
//!   transaction as the write.
//! - Deleting an account retracts its votes from every affected score,
//!   and removes its ledger rows and comments, atomically.

use crate::model::account::{NewUserAccount, UserAccount};
use crate::model::caller::UserId;
use crate::repo::alternative_repo::{like_pattern, normalize_list_limit, to_count};
use crate::repo::schema::{bool_to_int, ensure_connection_ready, int_to_bool, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use serde::Serialize;

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    is_admin,
    created_at
FROM users";

/// Query options for listing accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListQuery {
    /// Case-insensitive substring of username or email.
    pub search: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Page size. Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
}

/// One page of accounts, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPage {
    pub users: Vec<UserAccount>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
}

/// Outcome of a write guarded by the last-admin rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGuard {
    Applied,
    /// Refused: the target is the only remaining admin.
    LastAdmin,
}

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Inserts a validated account; it becomes admin if it is the first one.
    fn create_user(&self, account: &NewUserAccount) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserAccount>>;
    /// Finds an account holding either the username or the email.
    fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> RepoResult<Option<UserAccount>>;
    fn list_users(&self, query: &UserListQuery) -> RepoResult<UserPage>;
    fn set_admin(&self, id: UserId, is_admin: bool) -> RepoResult<AdminGuard>;
    fn delete_user(&self, id: UserId) -> RepoResult<AdminGuard>;
    fn count_users(&self) -> RepoResult<u64>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "alternatives", "votes", "comments"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, account: &NewUserAccount) -> RepoResult<UserId> {
        account.validate()?;

        self.conn.execute(
            "INSERT INTO users (id, username, email, is_admin)
             SELECT ?1, ?2, ?3, NOT EXISTS (SELECT 1 FROM users);",
            params![
                account.id.to_string(),
                account.username.as_str(),
                account.email.as_str(),
            ],
        )?;
        Ok(account.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserAccount>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> RepoResult<Option<UserAccount>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE username = ?1
                OR email = ?2
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![username.trim(), email.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<UserPage> {
        let mut filter = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let pattern = like_pattern(search);
                filter.push_str(" AND (username LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\')");
                bind_values.push(Value::Text(pattern.clone()));
                bind_values.push(Value::Text(pattern));
            }
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM users{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let total = to_count(total)?;

        let limit = normalize_list_limit(query.limit);
        let page = query.page.filter(|page| *page > 0).unwrap_or(1);
        let offset = i64::from(page - 1) * i64::from(limit);
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(offset));

        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}{filter} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        let pages = u32::try_from(total.div_ceil(u64::from(limit)))
            .map_err(|_| RepoError::InvalidData(format!("user page count overflow: {total}")))?;
        Ok(UserPage {
            users,
            page,
            pages,
            total,
        })
    }

    fn set_admin(&self, id: UserId, is_admin: bool) -> RepoResult<AdminGuard> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id_text = id.to_string();
        let current = load_is_admin(&tx, &id_text)?.ok_or(RepoError::NotFound(id))?;
        if current && !is_admin && count_admins(&tx)? <= 1 {
            return Ok(AdminGuard::LastAdmin);
        }

        tx.execute(
            "UPDATE users SET is_admin = ?2 WHERE id = ?1;",
            params![id_text, bool_to_int(is_admin)],
        )?;
        tx.commit()?;
        Ok(AdminGuard::Applied)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<AdminGuard> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id_text = id.to_string();
        let current = load_is_admin(&tx, &id_text)?.ok_or(RepoError::NotFound(id))?;
        if current && count_admins(&tx)? <= 1 {
            return Ok(AdminGuard::LastAdmin);
        }

        tx.execute(
            "UPDATE alternatives
             SET score = score - (
                 SELECT CASE votes.direction WHEN 'up' THEN 1 ELSE -1 END
                 FROM votes
                 WHERE votes.user_id = ?1
                   AND votes.alternative_id = alternatives.id
             )
             WHERE id IN (SELECT alternative_id FROM votes WHERE user_id = ?1);",
            [id_text.as_str()],
        )?;
        tx.execute("DELETE FROM votes WHERE user_id = ?1;", [id_text.as_str()])?;
        tx.execute("DELETE FROM comments WHERE author_id = ?1;", [id_text.as_str()])?;
        tx.execute("DELETE FROM users WHERE id = ?1;", [id_text.as_str()])?;
        tx.commit()?;
        Ok(AdminGuard::Applied)
    }

    fn count_users(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        to_count(total)
    }
}

fn load_is_admin(tx: &Transaction<'_>, id: &str) -> RepoResult<Option<bool>> {
    let value: Option<i64> = tx
        .query_row("SELECT is_admin FROM users WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .optional()?;
    value
        .map(|value| int_to_bool(value, "users.is_admin"))
        .transpose()
}

fn count_admins(tx: &Transaction<'_>) -> RepoResult<u64> {
    let admins: i64 = tx.query_row(
        "SELECT COUNT(*) FROM users WHERE is_admin = 1;",
        [],
        |row| row.get(0),
    )?;
    to_count(admins)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserAccount> {
    let id_text: String = row.get("id")?;
    Ok(UserAccount {
        id: parse_uuid(&id_text, "users.id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        is_admin: int_to_bool(row.get("is_admin")?, "users.is_admin")?,
        created_at: row.get("created_at")?,
    })
}
