mod common;

use altvote_core::db::open_db_in_memory;
use altvote_core::repo::vote_repo::list_votes_for_alternative;
use altvote_core::{
    SqliteVoteLedger, VoteAction, VoteDirection, VoteError, VoteLedger, VoteService,
};
use common::{ledger_net, ledger_rows, seed_alternative, stored_score};
use uuid::Uuid;

#[test]
fn scenario_two_users_vote_flip_and_retract() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Signal");
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    {
        let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let mut service = VoteService::new(ledger);

        assert_eq!(service.cast_vote(user_a, item, "up").unwrap().score, 1);
        assert_eq!(service.cast_vote(user_b, item, "up").unwrap().score, 2);

        let flipped = service.cast_vote(user_a, item, "down").unwrap();
        assert_eq!(flipped.score, 0);
        assert_eq!(flipped.action, VoteAction::Flipped);
        assert_eq!(flipped.direction, Some(VoteDirection::Down));

        let retracted = service.cast_vote(user_b, item, "up").unwrap();
        assert_eq!(retracted.score, -1);
        assert_eq!(retracted.action, VoteAction::Retracted);
        assert_eq!(retracted.direction, None);
    }

    assert_eq!(stored_score(&conn, item), -1);
    assert_eq!(ledger_rows(&conn, item), 1);
}

#[test]
fn repeated_vote_retracts_to_prior_score_and_removes_row() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Firefox");
    let user = Uuid::new_v4();

    {
        let mut ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let first = ledger.cast_vote(user, item, VoteDirection::Up).unwrap();
        assert_eq!(first.action, VoteAction::Created);
        assert_eq!(first.score, 1);

        let second = ledger.cast_vote(user, item, VoteDirection::Up).unwrap();
        assert_eq!(second.score, 0);
        assert!(ledger.get_vote(user, item).unwrap().is_none());
    }

    assert_eq!(ledger_rows(&conn, item), 0);
}

#[test]
fn downvote_retraction_restores_score() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Mastodon");
    let mut ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let user = Uuid::new_v4();

    assert_eq!(ledger.cast_vote(user, item, VoteDirection::Down).unwrap().score, -1);
    assert_eq!(ledger.cast_vote(user, item, VoteDirection::Down).unwrap().score, 0);
}

#[test]
fn flip_moves_score_by_exactly_two() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Nextcloud");
    let mut ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let other = Uuid::new_v4();
    let user = Uuid::new_v4();

    ledger.cast_vote(other, item, VoteDirection::Up).unwrap();
    let after_up = ledger.cast_vote(user, item, VoteDirection::Up).unwrap().score;
    let after_down = ledger.cast_vote(user, item, VoteDirection::Down).unwrap().score;
    assert_eq!(after_down - after_up, -2);

    let back_up = ledger.cast_vote(user, item, VoteDirection::Up).unwrap().score;
    assert_eq!(back_up - after_down, 2);

    let vote = ledger.get_vote(user, item).unwrap().unwrap();
    assert_eq!(vote.direction, VoteDirection::Up);
}

#[test]
fn unknown_item_is_not_found_and_leaves_other_scores_alone() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Proton Mail");
    let missing = Uuid::new_v4();
    let user = Uuid::new_v4();

    {
        let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let mut service = VoteService::new(ledger);
        service.cast_vote(user, item, "up").unwrap();

        let err = service.cast_vote(user, missing, "up").unwrap_err();
        assert!(matches!(err, VoteError::NotFound(id) if id == missing));
        assert_eq!(err.code(), "not_found");
    }

    assert_eq!(stored_score(&conn, item), 1);
    let orphan_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM votes WHERE alternative_id = ?1;",
            [missing.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphan_rows, 0);
}

#[test]
fn invalid_direction_is_rejected_without_ledger_mutation() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "LibreOffice");
    let user = Uuid::new_v4();

    {
        let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let mut service = VoteService::new(ledger);
        service.cast_vote(user, item, "down").unwrap();

        let err = service.cast_vote(user, item, "sideways").unwrap_err();
        assert!(matches!(err, VoteError::InvalidArgument(ref message) if message.contains("sideways")));
    }

    assert_eq!(stored_score(&conn, item), -1);
    assert_eq!(ledger_rows(&conn, item), 1);
}

#[test]
fn invalid_direction_wins_over_missing_item() {
    let mut conn = open_db_in_memory().unwrap();
    let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let mut service = VoteService::new(ledger);

    let err = service
        .cast_vote(Uuid::new_v4(), Uuid::new_v4(), "sideways")
        .unwrap_err();
    assert!(matches!(err, VoteError::InvalidArgument(_)));
}

#[test]
fn score_matches_ledger_after_mixed_sequence() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Jitsi");
    let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    let plan = [
        (0, VoteDirection::Up),
        (1, VoteDirection::Down),
        (2, VoteDirection::Up),
        (0, VoteDirection::Down),
        (3, VoteDirection::Down),
        (1, VoteDirection::Down),
        (4, VoteDirection::Up),
        (2, VoteDirection::Up),
        (0, VoteDirection::Up),
        (3, VoteDirection::Up),
        (4, VoteDirection::Up),
        (1, VoteDirection::Up),
    ];

    for (index, direction) in plan {
        {
            let mut ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
            ledger.cast_vote(users[index], item, direction).unwrap();
        }
        assert_eq!(stored_score(&conn, item), ledger_net(&conn, item));
        let per_pair: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(n), 0) FROM (
                    SELECT COUNT(*) AS n FROM votes GROUP BY user_id, alternative_id
                );",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(per_pair <= 1);
    }

    let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let tally = ledger.tally(item).unwrap();
    assert_eq!(tally.upvotes, 3);
    assert_eq!(tally.downvotes, 0);
    assert_eq!(tally.net(), 3);
}

#[test]
fn reconcile_repairs_drifted_score() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Thunderbird");
    {
        let mut ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        ledger.cast_vote(Uuid::new_v4(), item, VoteDirection::Up).unwrap();
        ledger.cast_vote(Uuid::new_v4(), item, VoteDirection::Up).unwrap();
        ledger.cast_vote(Uuid::new_v4(), item, VoteDirection::Down).unwrap();
    }
    conn.execute(
        "UPDATE alternatives SET score = 42 WHERE id = ?1;",
        [item.to_string()],
    )
    .unwrap();

    {
        let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let mut service = VoteService::new(ledger);
        assert_eq!(service.reconcile(item).unwrap(), 1);
        assert_eq!(service.tally(item).unwrap().net(), 1);
    }
    assert_eq!(stored_score(&conn, item), 1);
}

#[test]
fn tally_and_reconcile_report_missing_item() {
    let mut conn = open_db_in_memory().unwrap();
    let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let mut service = VoteService::new(ledger);
    let missing = Uuid::new_v4();

    assert!(matches!(service.tally(missing), Err(VoteError::NotFound(_))));
    assert!(matches!(service.reconcile(missing), Err(VoteError::NotFound(_))));
}

#[test]
fn current_vote_reflects_latest_state() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "OsmAnd");
    let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let mut service = VoteService::new(ledger);
    let user = Uuid::new_v4();

    assert!(service.current_vote(user, item).unwrap().is_none());
    service.cast_vote(user, item, "down").unwrap();
    let vote = service.current_vote(user, item).unwrap().unwrap();
    assert_eq!(vote.direction, VoteDirection::Down);
    assert_eq!(vote.user_id, user);
    assert_eq!(vote.alternative_id, item);
}

#[test]
fn vote_result_serializes_score_field() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Element");
    let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
    let mut service = VoteService::new(ledger);

    let result = service.cast_vote(Uuid::new_v4(), item, "up").unwrap();
    let json = serde_json::to_value(result).unwrap();
    assert_eq!(json["score"], 1);
    assert_eq!(json["action"], "created");
    assert_eq!(json["direction"], "up");
}

#[test]
fn ledger_rows_list_one_entry_per_voter() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Mastodon");
    let up_voter = Uuid::new_v4();
    let down_voter = Uuid::new_v4();
    {
        let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let mut service = VoteService::new(ledger);
        service.cast_vote(up_voter, item, "up").unwrap();
        service.cast_vote(down_voter, item, "up").unwrap();
        service.cast_vote(down_voter, item, "down").unwrap();
    }

    let votes = list_votes_for_alternative(&conn, item).unwrap();
    assert_eq!(votes.len(), 2);
    let direction_of = |user: Uuid| {
        votes
            .iter()
            .find(|vote| vote.user_id == user)
            .map(|vote| vote.direction)
    };
    assert_eq!(direction_of(up_voter), Some(VoteDirection::Up));
    assert_eq!(direction_of(down_voter), Some(VoteDirection::Down));
    assert!(votes.iter().all(|vote| vote.alternative_id == item));
    assert!(votes.iter().all(|vote| vote.updated_at >= vote.created_at));
}

#[test]
fn failed_score_write_rolls_back_ledger_row() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_alternative(&conn, "Briar");
    conn.execute_batch(
        "CREATE TRIGGER reject_score_write
         BEFORE UPDATE OF score ON alternatives
         BEGIN
             SELECT RAISE(ABORT, 'score write rejected');
         END;",
    )
    .unwrap();

    {
        let ledger = SqliteVoteLedger::try_new(&mut conn).unwrap();
        let mut service = VoteService::new(ledger);
        let err = service.cast_vote(Uuid::new_v4(), item, "up").unwrap_err();
        assert!(matches!(err, VoteError::StorageFailure(_)), "{err:?}");
        assert_eq!(err.code(), "storage_failure");
    }

    assert_eq!(ledger_rows(&conn, item), 0);
    assert_eq!(stored_score(&conn, item), 0);
}
