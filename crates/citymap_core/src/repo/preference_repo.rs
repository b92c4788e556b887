//! Saved-city and marker-color repository.
//!
//! # Responsibility
//! - Own the `users_cities` association and `user_settings` rows.
//! - Resolve city names through the `cities` table inside the same
//!   transaction as the association write.
//!
//! # Invariants
//! - An association is never inserted for a name absent from `cities`.
//! - At most one association exists per `(user_id, city_id)` pair.
//! - `user_settings.marker_color` only ever holds a `MarkerColor` code;
//!   anything else read back is reported as `InvalidData`.

use crate::model::preference::{DeleteOutcome, MarkerColor, SaveOutcome, UserId};
use crate::repo::{ensure_columns, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for per-user saved cities and settings.
pub trait PreferenceRepository {
    /// Lists saved city names in insertion order.
    fn list_saved_cities(&self, user_id: UserId) -> RepoResult<Vec<String>>;
    /// Saves one city for the user.
    fn save_city(&mut self, user_id: UserId, city_name: &str) -> RepoResult<SaveOutcome>;
    /// Removes one city from the user's list.
    fn remove_saved_city(&mut self, user_id: UserId, city_name: &str)
        -> RepoResult<DeleteOutcome>;
    /// Returns the stored marker color, or the palette default.
    fn get_marker_color(&self, user_id: UserId) -> RepoResult<MarkerColor>;
    /// Upserts the marker color; last write wins.
    fn set_marker_color(&self, user_id: UserId, color: MarkerColor) -> RepoResult<()>;
}

/// SQLite-backed preference repository.
pub struct SqlitePreferenceRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePreferenceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_columns(conn, "cities", &["id", "city"])?;
        ensure_columns(conn, "users_cities", &["user_id", "city_id"])?;
        ensure_columns(conn, "user_settings", &["user_id", "marker_color"])?;
        Ok(Self { conn })
    }
}

impl PreferenceRepository for SqlitePreferenceRepository<'_> {
    fn list_saved_cities(&self, user_id: UserId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.city
             FROM users_cities uc
             INNER JOIN cities c ON c.id = uc.city_id
             WHERE uc.user_id = ?1
             ORDER BY uc.rowid ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut cities = Vec::new();
        while let Some(row) = rows.next()? {
            cities.push(row.get(0)?);
        }
        Ok(cities)
    }

    fn save_city(&mut self, user_id: UserId, city_name: &str) -> RepoResult<SaveOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(city_id) = city_id_in_tx(&tx, city_name)? else {
            return Ok(SaveOutcome::UnknownCity);
        };

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO users_cities (user_id, city_id) VALUES (?1, ?2);",
            params![user_id, city_id],
        )?;
        tx.commit()?;

        if inserted == 0 {
            Ok(SaveOutcome::AlreadySaved)
        } else {
            Ok(SaveOutcome::Saved)
        }
    }

    fn remove_saved_city(
        &mut self,
        user_id: UserId,
        city_name: &str,
    ) -> RepoResult<DeleteOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(city_id) = city_id_in_tx(&tx, city_name)? else {
            return Ok(DeleteOutcome::UnknownCity);
        };

        let removed = tx.execute(
            "DELETE FROM users_cities WHERE user_id = ?1 AND city_id = ?2;",
            params![user_id, city_id],
        )?;
        tx.commit()?;

        if removed == 0 {
            Ok(DeleteOutcome::NotSaved)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }

    fn get_marker_color(&self, user_id: UserId) -> RepoResult<MarkerColor> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT marker_color FROM user_settings WHERE user_id = ?1;",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(code) => code.parse().map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid marker_color `{code}` for user {user_id}"
                ))
            }),
            None => Ok(MarkerColor::default()),
        }
    }

    fn set_marker_color(&self, user_id: UserId, color: MarkerColor) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO user_settings (user_id, marker_color) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET marker_color = excluded.marker_color;",
            params![user_id, color.code()],
        )?;
        Ok(())
    }
}

fn city_id_in_tx(tx: &Transaction<'_>, city_name: &str) -> RepoResult<Option<i64>> {
    let id = tx
        .query_row(
            "SELECT id FROM cities WHERE city = ?1 LIMIT 1;",
            [city_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}
