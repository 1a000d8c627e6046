//! Storage gateway for the catalog service.
//!
//! [`Database`] owns the PostgreSQL pool. Callers build parametrized
//! statements with `sqlx::query(..).bind(..)` and hand them to one of the
//! execution methods, which decode rows and map driver failures to
//! [`DbError`].

pub mod error;
pub mod module;
pub mod pool;

use async_trait::async_trait;
use catalog_kernel::settings::{DatabaseSettings, Environment, RowDecodePolicy};
use catalog_kernel::HealthCheck;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres};

pub use error::DbError;
pub use module::DbModule;

/// A statement with its positional parameters bound.
pub type Statement<'q> = Query<'q, Postgres, PgArguments>;

/// Handle to the relational store, cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool and verify the store answers.
    ///
    /// Any failure here means the service cannot serve traffic.
    pub async fn connect(
        settings: &DatabaseSettings,
        environment: &Environment,
    ) -> Result<Self, DbError> {
        let target = settings
            .resolve(environment)
            .map_err(|err| DbError::Config(err.to_string()))?;

        tracing::info!(
            target: "catalog-db",
            host = %target.host,
            port = target.port,
            database = %target.name,
            max_connections = settings.max_connections,
            "connecting to database"
        );

        let pool = pool::pool_options(settings)
            .connect_with(pool::connect_options(&target))
            .await?;

        let database = Self { pool };
        database.ping().await?;

        tracing::info!(target: "catalog-db", "successfully connected to database");
        Ok(database)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lightweight round-trip to the store.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Execute `statement` and decode every returned row.
    ///
    /// Rows that fail to decode are handled according to `policy`.
    pub async fn fetch_all<T>(
        &self,
        statement: Statement<'_>,
        policy: RowDecodePolicy,
    ) -> Result<Vec<T>, DbError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = statement.fetch_all(&self.pool).await?;
        collect_decoded(rows.iter().map(|row| T::from_row(row)), policy)
    }

    /// Execute `statement` and decode its single row.
    pub async fn fetch_one<T>(&self, statement: Statement<'_>) -> Result<T, DbError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let row = statement
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        T::from_row(&row).map_err(DbError::Decode)
    }

    /// Execute `statement` and return the number of affected rows.
    pub async fn execute(&self, statement: Statement<'_>) -> Result<u64, DbError> {
        let result = statement.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn is_healthy(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "catalog-db", error = %err, "database health check failed");
                false
            }
        }
    }
}

/// Gather decoded rows, skipping or failing on decode errors per `policy`.
fn collect_decoded<T, I>(decoded: I, policy: RowDecodePolicy) -> Result<Vec<T>, DbError>
where
    I: IntoIterator<Item = Result<T, sqlx::Error>>,
{
    let mut items = Vec::new();

    for (index, result) in decoded.into_iter().enumerate() {
        match result {
            Ok(item) => items.push(item),
            Err(err) => match policy {
                RowDecodePolicy::Skip => {
                    tracing::warn!(
                        target: "catalog-db",
                        row = index,
                        error = %err,
                        "skipping row that failed to decode"
                    );
                }
                RowDecodePolicy::Fail => return Err(DbError::Decode(err)),
            },
        }
    }

    Ok(items)
}
