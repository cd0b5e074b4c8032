//! ProviderHealthHandler - read-only health snapshot for observability.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::routing::{HealthTracker, ProviderHealth};

/// Handler for the provider health query.
pub struct ProviderHealthHandler {
    health: Arc<HealthTracker>,
}

impl ProviderHealthHandler {
    pub fn new(health: Arc<HealthTracker>) -> Self {
        Self { health }
    }

    /// Current per-provider health, in registration order.
    pub async fn handle(&self) -> Vec<ProviderHealth> {
        self.health.snapshot(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routing::BackoffPolicy;
    use crate::ports::ErrorClass;

    #[tokio::test]
    async fn snapshot_reflects_recorded_failures() {
        let health = Arc::new(HealthTracker::new(
            vec!["gemini".to_string()],
            BackoffPolicy::default(),
        ));
        health
            .record_failure("gemini", ErrorClass::RateLimited, Utc::now())
            .await;

        let handler = ProviderHealthHandler::new(health);
        let snapshot = handler.handle().await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "gemini");
        assert_eq!(snapshot[0].total_errors, 1);
        assert!(snapshot[0].in_cooldown);
    }
}
