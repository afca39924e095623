//! Zone store query functions.
//!
//! All statements go through `query_raw_params()` / `exec_raw_params()`.
//! Only active zones are ever returned to callers.

use chrono::{DateTime, Utc};
use jharia_watch_zone_models::{RiskLevel, RiskZone};
use moosicbox_json_utils::database::ToValue as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

const ZONE_COLUMNS: &str = "zone_id, zone_name, geometry, risk_level, risk_score, \
     subsidence_data, psinsar, description, affected_area, estimated_population, \
     safety_recommendations, nearest_safe_zone, bccl_area, is_active, last_updated";

/// Inserts a zone.
///
/// # Errors
///
/// Returns [`DbError::Validation`] if the zone breaks a store invariant,
/// or [`DbError`] if the write fails (including a duplicate `zone_id`).
pub async fn insert_zone(db: &dyn Database, zone: &RiskZone) -> Result<(), DbError> {
    zone.validate()?;

    db.exec_raw_params(
        &format!(
            "INSERT INTO risk_zones ({ZONE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ),
        &zone_params(zone)?,
    )
    .await?;

    Ok(())
}

/// Inserts all zones in order, stopping at the first failure.
///
/// # Errors
///
/// Returns [`DbError`] from the first zone that fails to insert.
pub async fn insert_zones(db: &dyn Database, zones: &[RiskZone]) -> Result<u64, DbError> {
    let mut inserted = 0u64;
    for zone in zones {
        insert_zone(db, zone).await?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Removes every zone from the store.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub async fn delete_all_zones(db: &dyn Database) -> Result<u64, DbError> {
    let deleted = db.exec_raw_params("DELETE FROM risk_zones", &[]).await?;
    Ok(deleted)
}

/// Lists active zones in `zone_id` order, optionally restricted to one
/// risk level.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn list_active_zones(
    db: &dyn Database,
    risk_level: Option<RiskLevel>,
) -> Result<Vec<RiskZone>, DbError> {
    let rows = match risk_level {
        Some(level) => {
            db.query_raw_params(
                &format!(
                    "SELECT {ZONE_COLUMNS} FROM risk_zones
                     WHERE is_active = 1 AND risk_level = $1
                     ORDER BY zone_id"
                ),
                &[DatabaseValue::String(level.to_string())],
            )
            .await?
        }
        None => {
            db.query_raw_params(
                &format!(
                    "SELECT {ZONE_COLUMNS} FROM risk_zones
                     WHERE is_active = 1
                     ORDER BY zone_id"
                ),
                &[],
            )
            .await?
        }
    };

    rows.iter().map(zone_from_row).collect()
}

/// Looks up an active zone by id.
///
/// Returns `None` if the zone does not exist or is inactive.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_active_zone(db: &dyn Database, zone_id: &str) -> Result<Option<RiskZone>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {ZONE_COLUMNS} FROM risk_zones WHERE zone_id = $1 AND is_active = 1"),
            &[DatabaseValue::String(zone_id.to_string())],
        )
        .await?;

    rows.first().map(zone_from_row).transpose()
}

/// Sets the soft-disable flag on a zone.
///
/// Returns `false` if no zone has the given id.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn set_zone_active(db: &dyn Database, zone_id: &str, active: bool) -> Result<bool, DbError> {
    let updated = db
        .exec_raw_params(
            "UPDATE risk_zones SET is_active = $1, last_updated = $2 WHERE zone_id = $3",
            &[
                DatabaseValue::Int64(i64::from(active)),
                DatabaseValue::String(Utc::now().to_rfc3339()),
                DatabaseValue::String(zone_id.to_string()),
            ],
        )
        .await?;

    Ok(updated > 0)
}

/// Returns the number of stored zones, active or not.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_zones(db: &dyn Database) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) as cnt FROM risk_zones", &[])
        .await?;

    let count: i64 = rows.first().map_or(0, |r| r.to_value("cnt").unwrap_or(0));

    u64::try_from(count).map_err(|e| DbError::Conversion {
        message: format!("Negative zone count {count}: {e}"),
    })
}

fn zone_params(zone: &RiskZone) -> Result<Vec<DatabaseValue>, DbError> {
    Ok(vec![
        DatabaseValue::String(zone.zone_id.clone()),
        DatabaseValue::String(serde_json::to_string(&zone.zone_name)?),
        DatabaseValue::String(serde_json::to_string(&zone.geometry)?),
        DatabaseValue::String(zone.risk_level.to_string()),
        DatabaseValue::Int64(i64::from(zone.risk_score)),
        optional_json(zone.subsidence_data.as_ref())?,
        optional_json(zone.psinsar.as_ref())?,
        optional_json(zone.description.as_ref())?,
        zone.affected_area.map_or(DatabaseValue::Null, DatabaseValue::Real64),
        zone.estimated_population
            .map_or(DatabaseValue::Null, |p| DatabaseValue::Int64(i64::from(p))),
        optional_json(zone.safety_recommendations.as_ref())?,
        optional_json(zone.nearest_safe_zone.as_ref())?,
        zone.bccl_area
            .as_ref()
            .map_or(DatabaseValue::Null, |a| DatabaseValue::String(a.clone())),
        DatabaseValue::Int64(i64::from(zone.is_active)),
        zone.last_updated
            .as_ref()
            .map_or(DatabaseValue::Null, |t| DatabaseValue::String(t.to_rfc3339())),
    ])
}

fn optional_json<T: Serialize>(value: Option<&T>) -> Result<DatabaseValue, DbError> {
    Ok(match value {
        Some(v) => DatabaseValue::String(serde_json::to_string(v)?),
        None => DatabaseValue::Null,
    })
}

fn zone_from_row(row: &Row) -> Result<RiskZone, DbError> {
    let zone_id: String = row
        .to_value("zone_id")
        .map_err(|e| read_error("zone_id", &e))?;

    let risk_level: String = row
        .to_value("risk_level")
        .map_err(|e| read_error("risk_level", &e))?;
    let risk_level: RiskLevel = risk_level.parse().map_err(|e| DbError::Conversion {
        message: format!("Zone {zone_id} has unknown risk level '{risk_level}': {e}"),
    })?;

    let risk_score: i64 = row
        .to_value("risk_score")
        .map_err(|e| read_error("risk_score", &e))?;
    let risk_score = u8::try_from(risk_score).map_err(|e| DbError::Conversion {
        message: format!("Zone {zone_id} has invalid risk score {risk_score}: {e}"),
    })?;

    let estimated_population: Option<i64> = row.to_value("estimated_population").unwrap_or(None);
    let estimated_population = estimated_population
        .map(u32::try_from)
        .transpose()
        .map_err(|e| DbError::Conversion {
            message: format!("Zone {zone_id} has invalid population: {e}"),
        })?;

    let is_active: i64 = row
        .to_value("is_active")
        .map_err(|e| read_error("is_active", &e))?;

    let last_updated: Option<String> = row.to_value("last_updated").unwrap_or(None);
    let last_updated = last_updated
        .map(|s| DateTime::parse_from_rfc3339(&s).map(|t| t.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| DbError::Conversion {
            message: format!("Zone {zone_id} has invalid last_updated: {e}"),
        })?;

    let zone_name: String = row
        .to_value("zone_name")
        .map_err(|e| read_error("zone_name", &e))?;
    let geometry: String = row
        .to_value("geometry")
        .map_err(|e| read_error("geometry", &e))?;

    Ok(RiskZone {
        zone_name: serde_json::from_str(&zone_name)?,
        geometry: serde_json::from_str(&geometry)?,
        risk_level,
        risk_score,
        subsidence_data: optional_json_column(row, "subsidence_data")?,
        psinsar: optional_json_column(row, "psinsar")?,
        description: optional_json_column(row, "description")?,
        affected_area: row.to_value("affected_area").unwrap_or(None),
        estimated_population,
        safety_recommendations: optional_json_column(row, "safety_recommendations")?,
        nearest_safe_zone: optional_json_column(row, "nearest_safe_zone")?,
        bccl_area: row.to_value("bccl_area").unwrap_or(None),
        is_active: is_active != 0,
        last_updated,
        zone_id,
    })
}

fn read_error(column: &str, e: &impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to read column {column}: {e}"),
    }
}

fn optional_json_column<T: DeserializeOwned>(row: &Row, name: &str) -> Result<Option<T>, DbError> {
    let raw: Option<String> = row.to_value(name).unwrap_or(None);
    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
}
