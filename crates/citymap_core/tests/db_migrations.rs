use citymap_core::db::migrations::latest_version;
use citymap_core::db::{open_db, open_db_in_memory, DbError};
use citymap_core::{CityRepository, SqliteCityRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "cities");
    assert_table_exists(&conn, "users_cities");
    assert_table_exists(&conn, "user_settings");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "users_cities");
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
fn externally_seeded_city_table_is_kept_on_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seeded.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE cities (id INTEGER PRIMARY KEY, city TEXT, lat REAL, lng REAL);
         INSERT INTO cities (city, lat, lng) VALUES ('Tokyo', 35.6897, 139.6922);
         INSERT INTO cities (city, lat, lng) VALUES ('Lima', -12.06, -77.0375);",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users_cities");

    let repo = SqliteCityRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count_cities().unwrap(), 2);
    let tokyo = repo.lookup("Tokyo").unwrap().unwrap();
    assert_eq!(tokyo.latitude, 35.6897);
    assert_eq!(tokyo.longitude, 139.6922);
}

#[test]
fn duplicated_saved_cities_block_the_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE cities (id INTEGER PRIMARY KEY, city TEXT, lat REAL, lng REAL);
         CREATE TABLE users_cities (user_id INTEGER, city_id INTEGER);
         INSERT INTO cities (id, city, lat, lng) VALUES (1, 'Oslo', 59.9133, 10.7389);
         INSERT INTO users_cities VALUES (7, 1);
         INSERT INTO users_cities VALUES (7, 1);",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::DuplicateSavedCities { pairs: 1 }));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let user_settings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'user_settings';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(user_settings, 0);
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO users_cities (user_id, city_id) VALUES (1, 4242);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
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
