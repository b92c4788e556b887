use citymap_core::db::open_db_in_memory;
use citymap_core::render::basemap::Basemap;
use citymap_core::{
    flush_logs, init_logging, City, CityRepository, MapRenderer, MapService, MarkerColor,
    RenderOutcome, SqliteCityRepository,
};

fn read_logs(dir: &std::path::Path) -> String {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect()
}

#[test]
fn unresolved_names_are_logged_for_the_operator() {
    let log_dir = tempfile::tempdir().unwrap();
    init_logging("info", log_dir.path().to_str().unwrap()).unwrap();

    let conn = open_db_in_memory().unwrap();
    let cities = SqliteCityRepository::try_new(&conn).unwrap();
    cities.insert_city(&City::new("Rome", 41.8933, 12.4828)).unwrap();

    let renderer = MapRenderer::new(Basemap::empty(), None, 400);
    let service = MapService::new(cities, &renderer);
    let out_dir = tempfile::tempdir().unwrap();
    let outcome = service
        .render(
            &out_dir.path().join("mixed.png"),
            &["Rome".to_string(), "Atlantis".to_string()],
            MarkerColor::Blue,
        )
        .unwrap();
    let RenderOutcome::Rendered { unresolved, .. } = outcome else {
        panic!("expected a rendered map");
    };
    assert_eq!(unresolved, vec!["Atlantis"]);

    flush_logs();
    let logs = read_logs(log_dir.path());
    let line = logs
        .lines()
        .find(|line| line.contains("event=city_unresolved"))
        .unwrap_or_else(|| panic!("no unresolved-city record in:\n{logs}"));
    assert!(line.contains("Atlantis"));
    assert!(!logs
        .lines()
        .any(|line| line.contains("event=city_unresolved") && line.contains("Rome")));
}
