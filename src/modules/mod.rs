pub mod books;

use std::sync::Arc;

use catalog_db::{Database, DbModule};
use catalog_kernel::{settings::Settings, ModuleRegistry};

use books::postgres::PgBookRepository;
use books::repository::ViewLimits;

/// Register the storage core module and the catalog modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    database: &Database,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register_core(Arc::new(DbModule::new(database.clone())))?;

    let repository = Arc::new(PgBookRepository::new(
        database.clone(),
        settings.catalog.row_decode_policy,
    ));
    registry.register_custom(books::create_module(
        repository,
        ViewLimits::from(&settings.catalog),
    ));
    Ok(())
}
