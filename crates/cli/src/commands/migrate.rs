//! Database migration command.
//!
//! Applies the migrations in `crates/server/migrations/`, which create the
//! `shop` schema and its `product`, `cart` and `customer_order` tables.

use tracing::info;

use cartwheel_server::db;

use super::{CommandError, database_url};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Migrations complete");
    Ok(())
}
