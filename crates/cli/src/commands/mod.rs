//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use thiserror::Error;

use cartwheel_server::config::get_database_url;
use cartwheel_server::services::ServiceError;

/// Environment variable naming the database.
pub const DATABASE_URL_VAR: &str = "SHOP_DATABASE_URL";

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Seed failed: {0}")]
    Seed(#[from] ServiceError),
}

/// Load `.env` and read the database URL.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();
    get_database_url(DATABASE_URL_VAR).ok_or(CommandError::MissingEnvVar(DATABASE_URL_VAR))
}
