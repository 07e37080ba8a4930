//! Account management use-cases.
//!
//! # Responsibility
//! - Registration with validation and uniqueness checks.
//! - Admin-only listing, promotion/demotion and deletion of accounts.
//!
//! # Invariants
//! - At least one admin remains once any admin exists.
//! - Callers may read their own account; every other account operation
//!   requires an admin caller.

use crate::model::account::{NewUserAccount, UserAccount};
use crate::model::caller::{Caller, UserId};
use crate::model::validation::ValidationError;
use crate::repo::user_repo::{AdminGuard, UserListQuery, UserPage, UserRepository};
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    Validation(ValidationError),
    /// Username or email is already registered.
    Duplicate { field: &'static str },
    NotFound(UserId),
    Forbidden(&'static str),
    /// The operation would leave the platform without an admin.
    LastAdmin(UserId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { field } => write!(f, "{field} is already registered"),
            Self::NotFound(id) => write!(f, "account not found: {id}"),
            Self::Forbidden(action) => write!(f, "not allowed to {action}"),
            Self::LastAdmin(id) => {
                write!(f, "account {id} is the last admin; at least one admin must remain")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent account state: {details}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for AccountServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type AccountServiceResult<T> = Result<T, AccountServiceError>;

/// Account service facade over repository implementations.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers an account for an identity-provider user id.
    ///
    /// The first account ever registered becomes admin.
    pub fn register(&self, account: NewUserAccount) -> AccountServiceResult<UserAccount> {
        let account = account.normalized();
        account.validate()?;

        if let Some(existing) = self
            .repo
            .find_by_username_or_email(&account.username, &account.email)?
        {
            let field = if existing.username.eq_ignore_ascii_case(&account.username) {
                "username"
            } else {
                "email"
            };
            return Err(AccountServiceError::Duplicate { field });
        }
        if self.repo.get_user(account.id)?.is_some() {
            return Err(AccountServiceError::Duplicate { field: "id" });
        }

        let id = self.repo.create_user(&account)?;
        let created = self.read_back(id, "registered account missing in read-back")?;
        info!(
            "event=account_register module=account status=ok user_id={id} is_admin={}",
            created.is_admin
        );
        Ok(created)
    }

    /// Gets one account. Callers may read themselves; admins read anyone.
    pub fn get(&self, caller: &Caller, id: UserId) -> AccountServiceResult<UserAccount> {
        if !caller.can_manage(id) {
            return Err(AccountServiceError::Forbidden("view this account"));
        }
        self.repo
            .get_user(id)?
            .ok_or(AccountServiceError::NotFound(id))
    }

    /// Lists accounts newest first. Admin only.
    pub fn list(&self, caller: &Caller, query: &UserListQuery) -> AccountServiceResult<UserPage> {
        require_admin(caller, "list accounts")?;
        Ok(self.repo.list_users(query)?)
    }

    /// Grants or revokes admin rights. Admin only.
    pub fn set_admin(
        &self,
        caller: &Caller,
        id: UserId,
        is_admin: bool,
    ) -> AccountServiceResult<UserAccount> {
        require_admin(caller, "change admin rights")?;
        guarded(id, self.repo.set_admin(id, is_admin)?)?;
        info!(
            "event=account_set_admin module=account status=ok user_id={id} is_admin={is_admin}"
        );
        self.read_back(id, "updated account missing in read-back")
    }

    /// Deletes an account, retracting its votes and removing its comments.
    /// Admin only.
    pub fn delete(&self, caller: &Caller, id: UserId) -> AccountServiceResult<()> {
        require_admin(caller, "delete accounts")?;
        guarded(id, self.repo.delete_user(id)?)?;
        info!("event=account_delete module=account status=ok user_id={id}");
        Ok(())
    }

    /// Number of registered accounts.
    pub fn count(&self) -> AccountServiceResult<u64> {
        Ok(self.repo.count_users()?)
    }

    fn read_back(&self, id: UserId, details: &'static str) -> AccountServiceResult<UserAccount> {
        self.repo
            .get_user(id)?
            .ok_or(AccountServiceError::InconsistentState(details))
    }
}

fn guarded(id: UserId, outcome: AdminGuard) -> AccountServiceResult<()> {
    match outcome {
        AdminGuard::Applied => Ok(()),
        AdminGuard::LastAdmin => {
            warn!(
                "event=account_guard module=account status=error user_id={id} error_code=last_admin"
            );
            Err(AccountServiceError::LastAdmin(id))
        }
    }
}

fn require_admin(caller: &Caller, action: &'static str) -> AccountServiceResult<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(AccountServiceError::Forbidden(action))
    }
}
