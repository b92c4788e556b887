use citymap_core::db::open_db_in_memory;
use citymap_core::{
    City, CityRepository, DeleteOutcome, MarkerColor, PreferenceRepository, PreferenceService,
    RepoError, SaveOutcome, SqliteCityRepository, SqlitePreferenceRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;

const USER: i64 = 1001;
const OTHER_USER: i64 = 2002;

fn seeded_conn() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let cities = SqliteCityRepository::try_new(&conn).unwrap();
    for city in [
        City::new("London", 51.5072, -0.1275),
        City::new("Paris", 48.8566, 2.3522),
        City::new("New York", 40.6943, -73.9249),
    ] {
        cities.insert_city(&city).unwrap();
    }
    conn
}

fn association_count(conn: &Connection, user_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM users_cities WHERE user_id = ?1;",
        [user_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn saving_unknown_city_inserts_nothing() {
    let mut conn = seeded_conn();
    {
        let mut repo = SqlitePreferenceRepository::try_new(&mut conn).unwrap();
        assert_eq!(repo.save_city(USER, "Atlantis").unwrap(), SaveOutcome::UnknownCity);
        assert!(repo.list_saved_cities(USER).unwrap().is_empty());
    }
    assert_eq!(association_count(&conn, USER), 0);
}

#[test]
fn saving_twice_reports_already_saved_and_keeps_one_row() {
    let mut conn = seeded_conn();
    {
        let mut repo = SqlitePreferenceRepository::try_new(&mut conn).unwrap();
        assert_eq!(repo.save_city(USER, "Paris").unwrap(), SaveOutcome::Saved);
        assert_eq!(repo.save_city(USER, "Paris").unwrap(), SaveOutcome::AlreadySaved);
    }
    assert_eq!(association_count(&conn, USER), 1);
}

#[test]
fn city_lookup_is_case_sensitive() {
    let mut conn = seeded_conn();
    {
        let cities = SqliteCityRepository::try_new(&conn).unwrap();
        assert!(cities.lookup("London").unwrap().is_some());
        assert!(cities.lookup("london").unwrap().is_none());
    }
    let mut repo = SqlitePreferenceRepository::try_new(&mut conn).unwrap();
    assert_eq!(repo.save_city(USER, "paris").unwrap(), SaveOutcome::UnknownCity);
}

#[test]
fn deleting_saved_city_succeeds_once() {
    let mut conn = seeded_conn();
    let mut service = PreferenceService::new(SqlitePreferenceRepository::try_new(&mut conn).unwrap());

    service.save_city(USER, "London").unwrap();
    assert!(service.delete_city(USER, "London").unwrap());
    assert!(!service.delete_city(USER, "London").unwrap());
    assert!(service.list_saved_cities(USER).unwrap().is_empty());
}

#[test]
fn delete_outcome_distinguishes_unknown_from_unsaved() {
    let mut conn = seeded_conn();
    let mut service = PreferenceService::new(SqlitePreferenceRepository::try_new(&mut conn).unwrap());

    assert_eq!(
        service.remove_saved_city(USER, "Atlantis").unwrap(),
        DeleteOutcome::UnknownCity
    );
    assert_eq!(
        service.remove_saved_city(USER, "Paris").unwrap(),
        DeleteOutcome::NotSaved
    );
    assert!(!service.delete_city(USER, "Atlantis").unwrap());
}

#[test]
fn saved_lists_are_per_user() {
    let mut conn = seeded_conn();
    let mut service = PreferenceService::new(SqlitePreferenceRepository::try_new(&mut conn).unwrap());

    service.save_city(USER, "London").unwrap();
    service.save_city(USER, "New York").unwrap();
    service.save_city(OTHER_USER, "Paris").unwrap();
    assert!(!service.delete_city(OTHER_USER, "London").unwrap());

    let mine = service
        .list_saved_cities(USER)
        .unwrap()
        .into_iter()
        .collect::<HashSet<_>>();
    assert_eq!(
        mine,
        HashSet::from(["London".to_string(), "New York".to_string()])
    );
    assert_eq!(service.list_saved_cities(OTHER_USER).unwrap(), vec!["Paris"]);
}

#[test]
fn service_trims_names_and_treats_blank_as_unknown() {
    let mut conn = seeded_conn();
    let mut service = PreferenceService::new(SqlitePreferenceRepository::try_new(&mut conn).unwrap());

    assert_eq!(service.save_city(USER, "  Paris ").unwrap(), SaveOutcome::Saved);
    assert_eq!(service.save_city(USER, "   ").unwrap(), SaveOutcome::UnknownCity);
    assert_eq!(service.list_saved_cities(USER).unwrap(), vec!["Paris"]);
}

#[test]
fn marker_color_defaults_to_red_and_last_write_wins() {
    let mut conn = seeded_conn();
    let service = PreferenceService::new(SqlitePreferenceRepository::try_new(&mut conn).unwrap());

    assert_eq!(service.get_marker_color(USER).unwrap(), MarkerColor::Red);
    service.set_marker_color(USER, MarkerColor::Green).unwrap();
    service.set_marker_color(USER, MarkerColor::Purple).unwrap();
    assert_eq!(service.get_marker_color(USER).unwrap(), MarkerColor::Purple);
    assert_eq!(service.get_marker_color(OTHER_USER).unwrap(), MarkerColor::Red);
}

#[test]
fn marker_color_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.db");
    {
        let mut conn = citymap_core::open_db(&path).unwrap();
        let repo = SqlitePreferenceRepository::try_new(&mut conn).unwrap();
        repo.set_marker_color(USER, MarkerColor::Orange).unwrap();
    }

    let mut conn = citymap_core::open_db(&path).unwrap();
    let repo = SqlitePreferenceRepository::try_new(&mut conn).unwrap();
    assert_eq!(repo.get_marker_color(USER).unwrap(), MarkerColor::Orange);
}

#[test]
fn stored_color_outside_palette_is_invalid_data() {
    let mut conn = seeded_conn();
    conn.execute(
        "INSERT INTO user_settings (user_id, marker_color) VALUES (?1, 'magenta');",
        [USER],
    )
    .unwrap();

    let repo = SqlitePreferenceRepository::try_new(&mut conn).unwrap();
    let err = repo.get_marker_color(USER).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_requires_schema() {
    let mut conn = Connection::open_in_memory().unwrap();
    let err = SqlitePreferenceRepository::try_new(&mut conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("cities")));
}

#[test]
fn insert_city_updates_existing_coordinates() {
    let conn = seeded_conn();
    let cities = SqliteCityRepository::try_new(&conn).unwrap();

    cities.insert_city(&City::new("Paris", 48.85, 2.35)).unwrap();
    let paris = cities.lookup("Paris").unwrap().unwrap();
    assert_eq!(paris.latitude, 48.85);
    assert_eq!(cities.count_cities().unwrap(), 3);

    let err = cities.insert_city(&City::new("Nowhere", 95.0, 0.0)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn seeded_row_with_out_of_range_coordinates_is_not_found() {
    let conn = seeded_conn();
    conn.execute(
        "INSERT INTO cities (city, lat, lng) VALUES ('Broken', 95.0, 0.0);",
        [],
    )
    .unwrap();
    let cities = SqliteCityRepository::try_new(&conn).unwrap();

    assert!(cities.lookup("Broken").unwrap().is_none());
    assert!(cities.lookup("Paris").unwrap().is_some());
}
