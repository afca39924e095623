#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for `JhariaWatch`.
//!
//! Serves the subsidence risk API: point risk checks, the zone map as
//! `GeoJSON`, single zone lookups and aggregate statistics. Zones live in
//! a `SQLite` store opened at startup; each request reads the active
//! zones and answers geometric questions in memory.

mod assessment;
mod handlers;
mod rate_limit;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use jharia_watch_database::{DbError, db, seed};
use rate_limit::RateLimiter;
use switchy_database::Database;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3001;

/// Shared application state.
pub struct AppState {
    /// Zone store connection.
    pub db: Arc<dyn Database>,
    /// When the server started, for the health check's uptime.
    pub started_at: Instant,
}

/// Startup settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// Zone store location (`ZONE_DB_PATH`).
    pub db_path: PathBuf,
    /// Insert the baseline zones when the store is empty
    /// (`SEED_ON_EMPTY`).
    pub seed_on_empty: bool,
    /// Requests allowed per client per window (`RATE_LIMIT_MAX`).
    pub rate_limit_max: u32,
    /// Length of the rate limit window (`RATE_LIMIT_WINDOW_SECS`).
    pub rate_limit_window: Duration,
}

impl ServerConfig {
    /// Reads settings from the environment, falling back to defaults for
    /// anything absent or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let seed_on_empty = std::env::var("SEED_ON_EMPTY")
            .ok()
            .is_none_or(|v| parse_flag(&v));
        let rate_limit_max = std::env::var("RATE_LIMIT_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(rate_limit::DEFAULT_MAX_REQUESTS);
        let rate_limit_window = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(rate_limit::DEFAULT_WINDOW, Duration::from_secs);

        Self {
            bind_addr,
            port,
            db_path: db::path_from_env(),
            seed_on_empty,
            rate_limit_max,
            rate_limit_window,
        }
    }
}

/// Anything other than an explicit "off" value counts as enabled.
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The zone store could not be opened or seeded.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The HTTP server failed to bind or crashed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/risk")
                    .route("/check", web::get().to(handlers::risk_check))
                    .route("/zones", web::get().to(handlers::zones))
                    .route("/zones/{zone_id}", web::get().to(handlers::zone_detail))
                    .route("/statistics", web::get().to(handlers::statistics)),
            ),
    );
}

/// Starts the risk API server.
///
/// Opens the zone store, seeds it when empty (unless disabled), and runs
/// the Actix-Web HTTP server until shutdown. Every route is subject to a
/// per-client rate limit. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the store cannot be opened or seeded, or
/// if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    log::info!("Opening zone store at {}...", config.db_path.display());
    let db_conn = db::open_db(&config.db_path).await?;

    if config.seed_on_empty {
        seed::seed_if_empty(db_conn.as_ref()).await?;
    }

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
        started_at: Instant::now(),
    });
    let limiter = web::Data::new(RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window,
    ));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(middleware::from_fn(rate_limit::limit))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(limiter.clone())
            .configure(configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await?;

    Ok(())
}
