use motionlines_core::db::migrations::latest_version;
use motionlines_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "motions",
        "change_recommendations",
        "amendments",
        "amendment_paragraphs",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("motions.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "motions");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_motion_cascades_to_amendment_paragraphs() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO motions (uuid, title, text) VALUES ('m1', 'T', '<p>x</p>');
         INSERT INTO amendments (uuid, lead_motion_uuid) VALUES ('a1', 'm1');
         INSERT INTO amendment_paragraphs (amendment_uuid, paragraph_no, text)
         VALUES ('a1', 0, '<p>y</p>');
         DELETE FROM motions WHERE uuid = 'm1';",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM amendment_paragraphs;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn check_constraints_reject_inverted_ranges_and_unknown_states() {
    let conn = open_db_in_memory().unwrap();
    let inverted = conn.execute(
        "INSERT INTO change_recommendations (uuid, target_uuid, line_from, line_to, text, type)
         VALUES ('r1', 'm1', 5, 3, '', 'replacement');",
        [],
    );
    assert!(inverted.is_err());

    conn.execute(
        "INSERT INTO motions (uuid, title, text) VALUES ('m1', 'T', '<p>x</p>');",
        [],
    )
    .unwrap();
    let unknown_state = conn.execute(
        "INSERT INTO amendments (uuid, lead_motion_uuid, state_merge) VALUES ('a1', 'm1', 'maybe');",
        [],
    );
    assert!(unknown_state.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
