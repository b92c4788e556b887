//! Schema upgrades for the city database.
//!
//! # Invariants
//! - Versions increase by one and match `PRAGMA user_version` after commit.
//! - All pending steps run in one transaction; a failed check or statement
//!   leaves the file at its previous version.
//! - Every statement is `IF NOT EXISTS`, so a seeded `cities` table and any
//!   saved cities survive the upgrade.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    /// Runs before `sql` and can refuse the step.
    precheck: Option<fn(&Connection) -> DbResult<()>>,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "cities_and_preferences",
    precheck: Some(reject_duplicate_saved_cities),
    sql: include_str!("0001_init.sql"),
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the database on `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = user_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }
    if from == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|step| step.version > from) {
        if let Some(precheck) = migration.precheck {
            precheck(&tx)?;
        }
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    Ok(())
}

fn user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// The unique pair index cannot be built over repeated saved cities.
fn reject_duplicate_saved_cities(conn: &Connection) -> DbResult<()> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'users_cities');",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(());
    }

    let pairs: u64 = conn.query_row(
        "SELECT COUNT(*) FROM (
            SELECT 1 FROM users_cities GROUP BY user_id, city_id HAVING COUNT(*) > 1
        );",
        [],
        |row| row.get(0),
    )?;
    if pairs > 0 {
        warn!("event=db_migrate module=db status=error reason=duplicate_saved_cities pairs={pairs}");
        return Err(DbError::DuplicateSavedCities { pairs });
    }
    Ok(())
}
