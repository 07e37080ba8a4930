mod common;

use altvote_core::db::open_db_in_memory;
use altvote_core::{Caller, CommentService, RepoError, SqliteCommentRepository};
use common::seed_alternative;
use uuid::Uuid;

#[test]
fn add_comment_trims_content_and_lists_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Signal");
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let author = Caller::user(Uuid::new_v4());

    let first = service
        .add_comment(&author, item, "  Switched last year.  ")
        .unwrap();
    assert_eq!(first.content, "Switched last year.");
    assert_eq!(first.author_id, author.user_id);
    assert!(first.created_at > 0);

    let second = service.add_comment(&author, item, "Still happy").unwrap();

    let listed = service.list_comments(item).unwrap();
    let ids: Vec<_> = listed.iter().map(|comment| comment.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn short_comment_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Signal");
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let err = service
        .add_comment(&Caller::user(Uuid::new_v4()), item, " ok ")
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(service.list_comments(item).unwrap().is_empty());
}

#[test]
fn comment_on_missing_alternative_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let missing = Uuid::new_v4();

    let err = service
        .add_comment(&Caller::user(Uuid::new_v4()), missing, "Looks promising")
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn comments_are_scoped_to_their_alternative() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_alternative(&conn, "Signal");
    let second = seed_alternative(&conn, "Firefox");
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let author = Caller::user(Uuid::new_v4());

    service.add_comment(&author, first, "About Signal").unwrap();
    service.add_comment(&author, second, "About Firefox").unwrap();

    let listed = service.list_comments(second).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "About Firefox");
}
