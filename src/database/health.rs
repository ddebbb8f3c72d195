use async_trait::async_trait;

use crate::database::manager::{DatabaseError, DatabaseManager};

/// Backing-store liveness probe used by `GET /health`.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    fn backend(&self) -> &'static str;
}

#[async_trait]
impl HealthCheck for DatabaseManager {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(self).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
