use async_trait::async_trait;

/// Reachability probe for a backing dependency.
///
/// The HTTP layer reports `healthy`/`unhealthy` from this without ever
/// terminating the process.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn is_healthy(&self) -> bool;
}
