#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `JhariaWatch` risk API server.
//!
//! ```text
//! jharia_watch_server [serve]
//! jharia_watch_server seed
//! ```
//!
//! Configuration comes from `BIND_ADDR`, `PORT`, `ZONE_DB_PATH`,
//! `SEED_ON_EMPTY`, `RATE_LIMIT_MAX` and `RATE_LIMIT_WINDOW_SECS`. Log
//! verbosity is controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use jharia_watch_database::{db::open_db, seed};
use jharia_watch_server::{ServerConfig, run_server};

#[derive(Parser)]
#[command(
    name = "jharia_watch_server",
    about = "Subsidence risk API for the Jharia coalfield"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Replace every stored zone with the baseline Jharia zones
    Seed,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = ServerConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await?,
        Commands::Seed => {
            let db = open_db(&config.db_path).await?;
            let inserted = seed::reseed(db.as_ref()).await?;
            println!(
                "Seeded {inserted} risk zones into {}",
                config.db_path.display()
            );
        }
    }

    Ok(())
}
