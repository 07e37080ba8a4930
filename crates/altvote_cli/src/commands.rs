//! Subcommand arguments and handlers.

use altvote_core::db::migrations::latest_version;
use altvote_core::{
    AccountService, AlternativeListQuery, AlternativePatch, AlternativeService, Caller,
    CommentService, NewAlternative, NewUserAccount, SqliteAlternativeRepository,
    SqliteCommentRepository, SqliteUserRepository, SqliteVoteLedger, UserListQuery, VoteService,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::Path;
use uuid::Uuid;

/// Required caller identity.
#[derive(Args, Debug)]
pub struct Identity {
    /// Authenticated user id
    #[arg(long)]
    pub user: Uuid,
    /// Treat the caller as an administrator
    #[arg(long)]
    pub admin: bool,
}

impl Identity {
    fn caller(&self) -> Caller {
        Caller {
            user_id: self.user,
            is_admin: self.admin,
        }
    }
}

/// Identity for commands that also work anonymously.
#[derive(Args, Debug)]
pub struct OptionalIdentity {
    /// Authenticated user id; omit for an anonymous caller
    #[arg(long)]
    pub user: Option<Uuid>,
    /// Treat the caller as an administrator
    #[arg(long, requires = "user")]
    pub admin: bool,
}

impl OptionalIdentity {
    fn caller(&self) -> Option<Caller> {
        self.user.map(|user_id| Caller {
            user_id,
            is_admin: self.admin,
        })
    }
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Alternative id
    pub id: Uuid,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub identity: Identity,
    #[arg(long)]
    pub title: String,
    /// Mainstream product being replaced
    #[arg(long)]
    pub replaces: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub reasons: String,
    #[arg(long)]
    pub benefits: String,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub category: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: Uuid,
    #[command(flatten)]
    pub identity: OptionalIdentity,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub category: Option<String>,
    /// Substring of title or replaced product
    #[arg(long)]
    pub search: Option<String>,
    /// Approval filter (admins only; others always see approved entries)
    #[arg(long)]
    pub approved: Option<bool>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[command(flatten)]
    pub identity: OptionalIdentity,
}

#[derive(Args, Debug)]
pub struct VoteArgs {
    pub id: Uuid,
    /// `up` or `down`; repeating your current direction retracts the vote
    pub direction: String,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    pub id: Uuid,
    pub content: String,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct ModerateArgs {
    pub id: Uuid,
    /// `true` to approve, `false` to reject
    #[arg(long, action = ArgAction::Set)]
    pub approved: bool,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: Uuid,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub replaces: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub reasons: Option<String>,
    #[arg(long)]
    pub benefits: Option<String>,
    /// New website; pass an empty string to remove it
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Approval state (admins only)
    #[arg(long)]
    pub approved: Option<bool>,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: Uuid,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Number of entries (default 6)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Title fragment to look for
    #[arg(long)]
    pub title: String,
    /// Replaced product; only used together with --category
    #[arg(long, requires = "category")]
    pub replaces: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Identity-provider user id of the new account
    #[arg(long)]
    pub user: Uuid,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Substring of username or email
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct SetAdminArgs {
    /// Account to change
    pub target: Uuid,
    /// `true` to grant admin rights, `false` to revoke them
    #[arg(long, action = ArgAction::Set)]
    pub grant: bool,
    #[command(flatten)]
    pub identity: Identity,
}

#[derive(Args, Debug)]
pub struct RemoveUserArgs {
    /// Account to delete
    pub target: Uuid,
    #[command(flatten)]
    pub identity: Identity,
}

pub fn init(db: &Path) -> Result<Value> {
    Ok(json!({
        "db": db.display().to_string(),
        "schema_version": latest_version(),
        "core_version": altvote_core::core_version(),
    }))
}

pub fn submit(conn: &Connection, args: SubmitArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    let submission = NewAlternative {
        title: args.title,
        replaces: args.replaces,
        description: args.description,
        reasons: args.reasons,
        benefits: args.benefits,
        website: args.website,
        category: args.category,
    };
    let created = service.submit(&args.identity.caller(), submission)?;
    Ok(serde_json::to_value(created)?)
}

pub fn show(conn: &Connection, args: ShowArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    let caller = args.identity.caller();
    let alternative = service.get(caller.as_ref(), args.id)?;
    Ok(serde_json::to_value(alternative)?)
}

pub fn list(conn: &Connection, args: ListArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    let caller = args.identity.caller();
    let query = AlternativeListQuery {
        category: args.category,
        search: args.search,
        approved: args.approved,
        limit: args.limit,
    };
    let items = service.list(caller.as_ref(), &query)?;
    Ok(serde_json::to_value(items)?)
}

pub fn edit(conn: &Connection, args: EditArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    let patch = AlternativePatch {
        title: args.title,
        replaces: args.replaces,
        description: args.description,
        reasons: args.reasons,
        benefits: args.benefits,
        website: args.website,
        category: args.category,
        approved: args.approved,
    };
    let edited = service.update(&args.identity.caller(), args.id, patch)?;
    Ok(serde_json::to_value(edited)?)
}

pub fn delete(conn: &Connection, args: DeleteArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    service.delete(&args.identity.caller(), args.id)?;
    Ok(json!({ "deleted": args.id }))
}

pub fn latest(conn: &Connection, args: LatestArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    Ok(serde_json::to_value(service.latest(args.limit)?)?)
}

pub fn check(conn: &Connection, args: CheckArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    let existing = service.check_exists(
        &args.title,
        args.replaces.as_deref(),
        args.category.as_deref(),
    )?;
    Ok(json!({ "exists": existing.is_some(), "alternative": existing }))
}

pub fn vote(conn: &mut Connection, args: VoteArgs) -> Result<Value> {
    let mut service = votes(conn)?;
    let result = service
        .cast_vote(args.identity.user, args.id, &args.direction)
        .with_context(|| format!("vote on alternative {} failed", args.id))?;
    Ok(serde_json::to_value(result)?)
}

pub fn tally(conn: &mut Connection, args: IdArgs) -> Result<Value> {
    let service = votes(conn)?;
    let tally = service.tally(args.id)?;
    Ok(json!({
        "alternative_id": args.id,
        "upvotes": tally.upvotes,
        "downvotes": tally.downvotes,
        "net": tally.net(),
    }))
}

pub fn reconcile(conn: &mut Connection, args: IdArgs) -> Result<Value> {
    let mut service = votes(conn)?;
    let score = service.reconcile(args.id)?;
    Ok(json!({ "alternative_id": args.id, "score": score }))
}

pub fn comment(conn: &Connection, args: CommentArgs) -> Result<Value> {
    let service = CommentService::new(SqliteCommentRepository::try_new(conn)?);
    let comment = service.add_comment(&args.identity.caller(), args.id, &args.content)?;
    Ok(serde_json::to_value(comment)?)
}

pub fn comments(conn: &Connection, args: IdArgs) -> Result<Value> {
    let service = CommentService::new(SqliteCommentRepository::try_new(conn)?);
    Ok(serde_json::to_value(service.list_comments(args.id)?)?)
}

pub fn moderate(conn: &Connection, args: ModerateArgs) -> Result<Value> {
    let service = alternatives(conn)?;
    let alternative = service.moderate(&args.identity.caller(), args.id, args.approved)?;
    Ok(serde_json::to_value(alternative)?)
}

pub fn stats(conn: &Connection, identity: OptionalIdentity) -> Result<Value> {
    let service = alternatives(conn)?;
    let caller = identity
        .caller()
        .context("stats requires --user and --admin")?;
    Ok(serde_json::to_value(service.dashboard_stats(&caller)?)?)
}

pub fn register(conn: &Connection, args: RegisterArgs) -> Result<Value> {
    let service = accounts(conn)?;
    let account = service.register(NewUserAccount {
        id: args.user,
        username: args.username,
        email: args.email,
    })?;
    Ok(serde_json::to_value(account)?)
}

pub fn users(conn: &Connection, args: UsersArgs) -> Result<Value> {
    let service = accounts(conn)?;
    let query = UserListQuery {
        search: args.search,
        page: args.page,
        limit: args.limit,
    };
    Ok(serde_json::to_value(service.list(&args.identity.caller(), &query)?)?)
}

pub fn set_admin(conn: &Connection, args: SetAdminArgs) -> Result<Value> {
    let service = accounts(conn)?;
    let account = service.set_admin(&args.identity.caller(), args.target, args.grant)?;
    Ok(serde_json::to_value(account)?)
}

pub fn remove_user(conn: &Connection, args: RemoveUserArgs) -> Result<Value> {
    let service = accounts(conn)?;
    service.delete(&args.identity.caller(), args.target)?;
    Ok(json!({ "deleted": args.target }))
}

fn alternatives(conn: &Connection) -> Result<AlternativeService<SqliteAlternativeRepository<'_>>> {
    Ok(AlternativeService::new(SqliteAlternativeRepository::try_new(conn)?))
}

fn votes(conn: &mut Connection) -> Result<VoteService<SqliteVoteLedger<'_>>> {
    Ok(VoteService::new(SqliteVoteLedger::try_new(conn)?))
}

fn accounts(conn: &Connection) -> Result<AccountService<SqliteUserRepository<'_>>> {
    Ok(AccountService::new(SqliteUserRepository::try_new(conn)?))
}
