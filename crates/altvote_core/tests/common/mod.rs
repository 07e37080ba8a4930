#![allow(dead_code)]

use altvote_core::{
    Alternative, AlternativeId, AlternativeRepository, NewAlternative,
    SqliteAlternativeRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

pub fn submission(title: &str, replaces: &str, category: &str) -> NewAlternative {
    NewAlternative {
        title: title.to_string(),
        replaces: replaces.to_string(),
        description: format!("{title} is a privacy-respecting option."),
        reasons: "Open source and community governed.".to_string(),
        benefits: "No tracking, no lock-in, works offline.".to_string(),
        website: Some("https://example.org".to_string()),
        category: category.to_string(),
    }
}

/// Inserts an approved alternative directly through the repository.
pub fn seed_alternative(conn: &Connection, title: &str) -> AlternativeId {
    let repo = SqliteAlternativeRepository::try_new(conn).unwrap();
    let alternative = Alternative::from_submission(
        submission(title, &format!("{title} Replaced"), "misc"),
        Uuid::new_v4(),
        true,
    );
    repo.create_alternative(&alternative).unwrap()
}

pub fn stored_score(conn: &Connection, id: AlternativeId) -> i64 {
    conn.query_row(
        "SELECT score FROM alternatives WHERE id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn ledger_rows(conn: &Connection, id: AlternativeId) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM votes WHERE alternative_id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

/// Score implied by the ledger rows: `#up - #down`.
pub fn ledger_net(conn: &Connection, id: AlternativeId) -> i64 {
    conn.query_row(
        "SELECT COALESCE(SUM(CASE direction WHEN 'up' THEN 1 ELSE -1 END), 0)
         FROM votes
         WHERE alternative_id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
