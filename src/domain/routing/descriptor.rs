//! Provider descriptors - the identity of one callable AI capability.

use serde::Serialize;

use super::TaskTier;

/// Identity and routing metadata for one registered provider/model pair.
///
/// Immutable after registration. The name keys the health tracker and the
/// orchestrator's adapter table.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    /// Unique provider name.
    pub name: String,
    /// Task tiers this provider is suitable for.
    pub tiers: Vec<TaskTier>,
    /// Relative cost unit for selection tie-breaking (lower is preferred).
    pub cost_weight: u32,
    /// Soft requests-per-minute quota.
    pub max_requests_per_minute: u32,
}

impl ProviderDescriptor {
    /// Creates a new descriptor.
    pub fn new(
        name: impl Into<String>,
        tiers: Vec<TaskTier>,
        cost_weight: u32,
        max_requests_per_minute: u32,
    ) -> Self {
        Self {
            name: name.into(),
            tiers,
            cost_weight,
            max_requests_per_minute,
        }
    }

    /// Whether this provider is suitable for the given tier.
    pub fn supports(&self, tier: TaskTier) -> bool {
        self.tiers.contains(&tier)
    }
}
