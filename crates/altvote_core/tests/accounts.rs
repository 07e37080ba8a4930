mod common;

use altvote_core::db::open_db_in_memory;
use altvote_core::{
    AccountService, AccountServiceError, AlternativeService, Caller, CommentService,
    NewUserAccount, SqliteAlternativeRepository, SqliteCommentRepository, SqliteUserRepository,
    SqliteVoteLedger, UserAccount, UserListQuery, ValidationError, VoteService,
};
use common::{ledger_net, ledger_rows, seed_alternative, stored_score};
use rusqlite::Connection;
use uuid::Uuid;

fn accounts(conn: &Connection) -> AccountService<SqliteUserRepository<'_>> {
    AccountService::new(SqliteUserRepository::try_new(conn).unwrap())
}

fn register(conn: &Connection, username: &str) -> UserAccount {
    accounts(conn)
        .register(NewUserAccount {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.org"),
        })
        .unwrap()
}

#[test]
fn first_registered_account_is_admin() {
    let conn = open_db_in_memory().unwrap();

    let first = register(&conn, "ada");
    let second = register(&conn, "grace");

    assert!(first.is_admin);
    assert!(!second.is_admin);
    assert!(first.created_at > 0);
    assert_eq!(accounts(&conn).count().unwrap(), 2);
}

#[test]
fn registration_is_validated_and_unique() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "ada");
    let service = accounts(&conn);

    let same_name = service.register(NewUserAccount {
        id: Uuid::new_v4(),
        username: "ADA".to_string(),
        email: "other@example.org".to_string(),
    });
    assert!(matches!(
        same_name,
        Err(AccountServiceError::Duplicate { field: "username" })
    ));

    let same_email = service.register(NewUserAccount {
        id: Uuid::new_v4(),
        username: "lovelace".to_string(),
        email: " Ada@Example.org ".to_string(),
    });
    assert!(matches!(
        same_email,
        Err(AccountServiceError::Duplicate { field: "email" })
    ));

    let bad_email = service.register(NewUserAccount {
        id: Uuid::new_v4(),
        username: "lovelace".to_string(),
        email: "not-an-email".to_string(),
    });
    assert!(matches!(
        bad_email,
        Err(AccountServiceError::Validation(ValidationError::InvalidEmail(_)))
    ));
    assert_eq!(service.count().unwrap(), 1);
}

#[test]
fn listing_is_admin_only_searchable_and_paged() {
    let conn = open_db_in_memory().unwrap();
    let admin = register(&conn, "ada");
    register(&conn, "grace");
    let newest = register(&conn, "gregor");
    let service = accounts(&conn);

    assert!(matches!(
        service.list(&Caller::user(newest.id), &UserListQuery::default()),
        Err(AccountServiceError::Forbidden(_))
    ));

    let caller = Caller::admin(admin.id);
    let first_page = service
        .list(
            &caller,
            &UserListQuery {
                limit: Some(2),
                ..UserListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(first_page.total, 3);
    assert_eq!(first_page.pages, 2);
    assert_eq!(first_page.page, 1);
    assert_eq!(first_page.users.len(), 2);
    assert_eq!(first_page.users[0].id, newest.id);

    let second_page = service
        .list(
            &caller,
            &UserListQuery {
                page: Some(2),
                limit: Some(2),
                ..UserListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(second_page.users.len(), 1);
    assert_eq!(second_page.users[0].id, admin.id);

    let searched = service
        .list(
            &caller,
            &UserListQuery {
                search: Some("GR".to_string()),
                ..UserListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(searched.total, 2);
    assert!(searched.users.iter().all(|user| user.username.starts_with("gr")));
}

#[test]
fn last_admin_cannot_be_demoted_or_deleted() {
    let conn = open_db_in_memory().unwrap();
    let ada = register(&conn, "ada");
    let grace = register(&conn, "grace");
    let service = accounts(&conn);
    let as_ada = Caller::admin(ada.id);

    assert!(matches!(
        service.set_admin(&as_ada, ada.id, false),
        Err(AccountServiceError::LastAdmin(id)) if id == ada.id
    ));
    assert!(matches!(
        service.delete(&as_ada, ada.id),
        Err(AccountServiceError::LastAdmin(_))
    ));
    assert!(service.get(&as_ada, ada.id).unwrap().is_admin);

    let promoted = service.set_admin(&as_ada, grace.id, true).unwrap();
    assert!(promoted.is_admin);
    let demoted = service.set_admin(&as_ada, ada.id, false).unwrap();
    assert!(!demoted.is_admin);

    let as_grace = Caller::admin(grace.id);
    assert!(matches!(
        service.set_admin(&as_grace, grace.id, false),
        Err(AccountServiceError::LastAdmin(_))
    ));
    service.delete(&as_grace, ada.id).unwrap();
    assert!(matches!(
        service.get(&as_grace, ada.id),
        Err(AccountServiceError::NotFound(_))
    ));
}

#[test]
fn account_changes_require_admin_caller() {
    let conn = open_db_in_memory().unwrap();
    let ada = register(&conn, "ada");
    let grace = register(&conn, "grace");
    let service = accounts(&conn);
    let as_grace = Caller::user(grace.id);

    assert!(matches!(
        service.set_admin(&as_grace, grace.id, true),
        Err(AccountServiceError::Forbidden(_))
    ));
    assert!(matches!(
        service.delete(&as_grace, ada.id),
        Err(AccountServiceError::Forbidden(_))
    ));
    assert!(matches!(
        service.get(&as_grace, ada.id),
        Err(AccountServiceError::Forbidden(_))
    ));
    assert_eq!(service.get(&as_grace, grace.id).unwrap().username, "grace");
    assert!(matches!(
        service.set_admin(&Caller::admin(ada.id), Uuid::new_v4(), true),
        Err(AccountServiceError::NotFound(_))
    ));
}

#[test]
fn deleting_account_retracts_votes_and_removes_comments() {
    let mut conn = open_db_in_memory().unwrap();
    let admin = register(&conn, "ada");
    let leaving = register(&conn, "grace");
    let staying = Uuid::new_v4();
    let first = seed_alternative(&conn, "Signal");
    let second = seed_alternative(&conn, "Firefox");

    {
        let mut votes = VoteService::new(SqliteVoteLedger::try_new(&mut conn).unwrap());
        votes.cast_vote(leaving.id, first, "up").unwrap();
        votes.cast_vote(staying, first, "up").unwrap();
        votes.cast_vote(leaving.id, second, "down").unwrap();
    }
    {
        let comments = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
        comments
            .add_comment(&Caller::user(leaving.id), first, "Great switch")
            .unwrap();
        comments
            .add_comment(&Caller::user(staying), first, "Agreed here")
            .unwrap();
    }
    assert_eq!(stored_score(&conn, first), 2);
    assert_eq!(stored_score(&conn, second), -1);

    accounts(&conn)
        .delete(&Caller::admin(admin.id), leaving.id)
        .unwrap();

    assert_eq!(stored_score(&conn, first), 1);
    assert_eq!(stored_score(&conn, second), 0);
    assert_eq!(stored_score(&conn, first), ledger_net(&conn, first));
    assert_eq!(ledger_rows(&conn, first), 1);
    assert_eq!(ledger_rows(&conn, second), 0);

    let comments = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let remaining = comments.list_comments(first).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].author_id, staying);
}

#[test]
fn dashboard_counts_registered_accounts() {
    let conn = open_db_in_memory().unwrap();
    let admin = register(&conn, "ada");
    register(&conn, "grace");
    seed_alternative(&conn, "Signal");

    let service = AlternativeService::new(SqliteAlternativeRepository::try_new(&conn).unwrap());
    let stats = service.dashboard_stats(&Caller::admin(admin.id)).unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_alternatives, 1);
    assert_eq!(stats.latest.len(), 1);
}
