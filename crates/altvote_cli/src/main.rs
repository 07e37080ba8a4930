//! `altvote` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto core services over one SQLite file.
//! - Stand in for the identity provider via `--user` / `--admin`.
//! - Print results as JSON on stdout; diagnostics go to the log target.

use altvote_core::{default_log_level, init_logging, DbOptions, LoggingConfig};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error};
use std::path::PathBuf;
use std::time::Duration;

mod commands;

use commands::{
    CheckArgs, CommentArgs, DeleteArgs, EditArgs, IdArgs, LatestArgs, ListArgs, ModerateArgs,
    OptionalIdentity, RegisterArgs, RemoveUserArgs, SetAdminArgs, ShowArgs, SubmitArgs, UsersArgs,
    VoteArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "altvote",
    version,
    about = "Submit, vote on and moderate ethical product alternatives"
)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "ALTVOTE_DB", global = true, default_value = "altvote.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "ALTVOTE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Write rolling log files to this absolute directory instead of stderr
    #[arg(long, env = "ALTVOTE_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// How long a vote waits for a competing writer, in milliseconds
    #[arg(long, global = true, default_value_t = 5000)]
    busy_timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and apply migrations
    Init,
    /// Submit a new alternative
    Submit(SubmitArgs),
    /// Show one alternative
    Show(ShowArgs),
    /// List alternatives
    List(ListArgs),
    /// Edit an alternative (submitter or admin)
    Edit(EditArgs),
    /// Delete an alternative with its votes and comments (submitter or admin)
    Delete(DeleteArgs),
    /// Newest approved alternatives
    Latest(LatestArgs),
    /// Look for an existing alternative similar to a draft
    Check(CheckArgs),
    /// Cast, flip or retract a vote
    Vote(VoteArgs),
    /// Count up/down votes from the ledger
    Tally(IdArgs),
    /// Recompute the stored score from the ledger
    Reconcile(IdArgs),
    /// Comment on an alternative
    Comment(CommentArgs),
    /// List comments of an alternative, newest first
    Comments(IdArgs),
    /// Approve or reject a submission (admin)
    Moderate(ModerateArgs),
    /// Moderation dashboard counters (admin)
    Stats(OptionalIdentity),
    /// Register an account; the first one becomes admin
    Register(RegisterArgs),
    /// List accounts (admin)
    Users(UsersArgs),
    /// Grant or revoke admin rights (admin)
    SetAdmin(SetAdminArgs),
    /// Delete an account, retracting its votes (admin)
    RemoveUser(RemoveUserArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let options = DbOptions {
        busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
    };
    let mut conn = altvote_core::open_db_with_options(&cli.db, &options)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    debug!(
        "event=cli_dispatch module=cli status=start db={} command={:?}",
        cli.db.display(),
        cli.command
    );

    let result = match cli.command {
        Command::Init => commands::init(&cli.db),
        Command::Submit(args) => commands::submit(&conn, args),
        Command::Show(args) => commands::show(&conn, args),
        Command::List(args) => commands::list(&conn, args),
        Command::Edit(args) => commands::edit(&conn, args),
        Command::Delete(args) => commands::delete(&conn, args),
        Command::Latest(args) => commands::latest(&conn, args),
        Command::Check(args) => commands::check(&conn, args),
        Command::Vote(args) => commands::vote(&mut conn, args),
        Command::Tally(args) => commands::tally(&mut conn, args),
        Command::Reconcile(args) => commands::reconcile(&mut conn, args),
        Command::Comment(args) => commands::comment(&conn, args),
        Command::Comments(args) => commands::comments(&conn, args),
        Command::Moderate(args) => commands::moderate(&conn, args),
        Command::Stats(identity) => commands::stats(&conn, identity),
        Command::Register(args) => commands::register(&conn, args),
        Command::Users(args) => commands::users(&conn, args),
        Command::SetAdmin(args) => commands::set_admin(&conn, args),
        Command::RemoveUser(args) => commands::remove_user(&conn, args),
    };
    let output = result.inspect_err(|err| {
        error!("event=cli_dispatch module=cli status=error error={err:#}");
    })?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let config = match (&cli.log_dir, &cli.log_level) {
        (Some(dir), level) => LoggingConfig::file(
            level.as_deref().unwrap_or(default_log_level()),
            dir.clone(),
        ),
        (None, Some(level)) => LoggingConfig::stderr(level.as_str()),
        (None, None) => LoggingConfig::stderr("warn"),
    };
    init_logging(&config).map_err(|err| anyhow!(err))
}
