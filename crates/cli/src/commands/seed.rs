//! Seed the configured database with the sample catalog.

use tracing::info;

use cartwheel_server::db::{self, PgStore};
use cartwheel_server::services::CatalogService;

use super::{CommandError, database_url};

/// Insert the sample products unless the catalog already has products.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database is
/// unreachable, or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let store = PgStore::new(pool);
    let count = CatalogService::new(&store).seed_catalog().await?;

    if count == 0 {
        info!("Catalog already has products, nothing to seed");
    } else {
        info!(count, "Seeded sample catalog");
    }
    Ok(())
}
