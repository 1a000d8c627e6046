use async_trait::async_trait;
use catalog_kernel::{InitCtx, Module};

use crate::Database;

/// Registers the storage gateway with the module registry so that the pool
/// is closed after every module depending on it has stopped.
pub struct DbModule {
    database: Database,
}

impl DbModule {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            max_connections = ctx.settings.database.max_connections,
            min_connections = ctx.settings.database.min_connections,
            max_lifetime_secs = ctx.settings.database.max_lifetime_secs,
            "storage gateway ready"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.database.close().await;
        tracing::info!(module = self.name(), "database pool closed");
        Ok(())
    }
}
