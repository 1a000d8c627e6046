//! Connection pool construction.
//!
//! The pool is bounded in size, keeps a small idle reserve, and recycles every
//! connection after `max_lifetime_secs`.

use std::time::Duration;

use catalog_kernel::settings::{ConnectionTarget, DatabaseSettings};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Connection options for a resolved target. Parameters are passed as
/// structured options, never spliced into a connection string.
pub fn connect_options(target: &ConnectionTarget) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&target.host)
        .port(target.port)
        .database(&target.name)
        .username(&target.user)
        .password(&target.password)
        .application_name("catalog-app")
}

/// Pool sizing and recycling from settings.
///
/// The idle reserve is clamped to the pool maximum.
pub fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    let max_connections = settings.max_connections.max(1);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(settings.min_connections.min(max_connections))
        .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
}
