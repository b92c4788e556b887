//! City and preference database.
//!
//! One SQLite file holds three tables:
//!
//! - `cities(id, city, lat, lng)`: reference coordinates. Usually filled by
//!   an external seeding job; `citymap seed-city` adds single rows.
//! - `users_cities(user_id, city_id)`: saved cities. `city_id` references
//!   `cities.id`, and `idx_users_cities_pair` keeps each pair unique.
//! - `user_settings(user_id, marker_color)`: one color code per user,
//!   `'red'` when the row was created without one.
//!
//! # Invariants
//! - `PRAGMA user_version` is the schema version.
//! - A file seeded before this schema existed upgrades in place; seeded
//!   `cities` rows are never rewritten by a migration.
//! - Saved-city pairs that are already duplicated block the upgrade with
//!   [`DbError::DuplicateSavedCities`] instead of being merged.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// `users_cities` holds this many repeated `(user_id, city_id)` pairs.
    DuplicateSavedCities { pairs: u64 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::DuplicateSavedCities { pairs } => write!(
                f,
                "users_cities has {pairs} duplicated (user_id, city_id) pairs; remove them before upgrading"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::DuplicateSavedCities { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
