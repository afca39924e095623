//! Database connection utilities.

use std::path::{Path, PathBuf};

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

use crate::DbError;

/// Default path for the zone store.
pub const DEFAULT_DB_PATH: &str = "data/zones.db";

/// Resolves the zone store path from the `ZONE_DB_PATH` environment
/// variable, falling back to [`DEFAULT_DB_PATH`].
#[must_use]
pub fn path_from_env() -> PathBuf {
    std::env::var("ZONE_DB_PATH").map_or_else(|_| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}

/// Opens (or creates) the zone store `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the parent directory cannot be created, the
/// database cannot be opened, or schema creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates the zone table and its indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS risk_zones (
            zone_id                 TEXT PRIMARY KEY,
            zone_name               TEXT NOT NULL,
            geometry                TEXT NOT NULL,
            risk_level              TEXT NOT NULL,
            risk_score              INTEGER NOT NULL,
            subsidence_data         TEXT,
            psinsar                 TEXT,
            description             TEXT,
            affected_area           REAL,
            estimated_population    INTEGER,
            safety_recommendations  TEXT,
            nearest_safe_zone       TEXT,
            bccl_area               TEXT,
            is_active               INTEGER NOT NULL DEFAULT 1,
            last_updated            TEXT
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_risk_zones_level
         ON risk_zones (risk_level)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_risk_zones_active
         ON risk_zones (is_active)",
    )
    .await?;

    Ok(())
}
