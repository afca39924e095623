#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk zone store for JhariaWatch.
//!
//! Persists [`RiskZone`] records in `SQLite` through `switchy_database`.
//! Scalar attributes get their own columns; nested and bilingual
//! attributes are stored as JSON text. Geometric questions are answered
//! in memory by `jharia_watch_spatial` over the rows returned here.
//!
//! [`RiskZone`]: jharia_watch_zone_models::RiskZone

pub mod db;
pub mod queries;
pub mod seed;

use jharia_watch_zone_models::ZoneValidationError;

/// Errors that can occur during zone store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The database could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A zone broke a store invariant and was not written.
    #[error("Invalid zone: {0}")]
    Validation(#[from] ZoneValidationError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
