//! City reference repository.
//!
//! # Responsibility
//! - Resolve city names to coordinates.
//! - Provide the operator seeding path for the reference table.
//!
//! # Invariants
//! - Lookup is an exact, case-sensitive match on `cities.city`.
//! - Absence is `Ok(None)`, never an error.
//! - Rows with out-of-range coordinates resolve to `Ok(None)` with a warning.

use crate::model::city::{City, Coordinates};
use crate::repo::{ensure_columns, RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

/// Read access to city reference data.
pub trait CityRepository {
    /// Returns coordinates for an exact name match.
    fn lookup(&self, name: &str) -> RepoResult<Option<Coordinates>>;
    /// Inserts or replaces one reference row.
    fn insert_city(&self, city: &City) -> RepoResult<()>;
    /// Returns the number of reference rows.
    fn count_cities(&self) -> RepoResult<u64>;
}

/// SQLite-backed city repository.
pub struct SqliteCityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCityRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_columns(conn, "cities", &["id", "city", "lat", "lng"])?;
        Ok(Self { conn })
    }
}

impl CityRepository for SqliteCityRepository<'_> {
    fn lookup(&self, name: &str) -> RepoResult<Option<Coordinates>> {
        // `=` on TEXT uses the BINARY collation, so the match is case-sensitive.
        let row = self
            .conn
            .query_row(
                "SELECT lat, lng FROM cities WHERE city = ?1 LIMIT 1;",
                [name],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
            )
            .optional()?;

        match row {
            Some((lat, lng)) => {
                let coordinates = Coordinates::new(lat, lng);
                if !coordinates.is_valid() {
                    warn!(
                        "event=city_lookup module=repo status=skip reason=invalid_coordinates city={name:?} lat={lat} lng={lng}"
                    );
                    return Ok(None);
                }
                Ok(Some(coordinates))
            }
            None => Ok(None),
        }
    }

    fn insert_city(&self, city: &City) -> RepoResult<()> {
        if city.name.trim().is_empty() {
            return Err(RepoError::InvalidData("city name cannot be empty".to_string()));
        }
        if !city.coordinates.is_valid() {
            return Err(RepoError::InvalidData(format!(
                "city `{}` has out-of-range coordinates",
                city.name
            )));
        }

        // `cities.city` is not guaranteed UNIQUE in externally seeded databases.
        let name = city.name.as_str();
        let Coordinates {
            latitude,
            longitude,
        } = city.coordinates;
        let changed = self.conn.execute(
            "UPDATE cities SET lat = ?2, lng = ?3 WHERE city = ?1;",
            params![name, latitude, longitude],
        )?;
        if changed == 0 {
            self.conn.execute(
                "INSERT INTO cities (city, lat, lng) VALUES (?1, ?2, ?3);",
                params![name, latitude, longitude],
            )?;
        }
        Ok(())
    }

    fn count_cities(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cities;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative city count {count}")))
    }
}
