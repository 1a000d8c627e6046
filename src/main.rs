use std::sync::Arc;

use anyhow::Context;
use catalog_app::modules;
use catalog_db::Database;
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry).context("failed to initialize logging")?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        prefix = %settings.server.api_prefix,
        "catalog-app bootstrap starting"
    );

    let database = Database::connect(&settings.database, &settings.environment)
        .await
        .context("failed to connect to database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &database, &settings)?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry
        .run(
            &ctx,
            catalog_http::start_server(&registry, &settings, Arc::new(database.clone())),
        )
        .await
}
