//! Service Selector - ordered provider candidates for a task tier.
//!
//! Selection: filter by tier affinity, drop providers in cooldown, then
//! order by cost weight, recent error count, and registration order. When
//! every affine provider is cooling down, the full affine list is returned
//! as a last resort so a total outage still attempts a call; that path is
//! flagged and logged distinctly.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::domain::RegistrationError;

use super::{HealthTracker, ProviderDescriptor, TaskTier};

/// Ordered candidate list for one respond call.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Candidates to try, in order.
    pub candidates: Vec<ProviderDescriptor>,
    /// True when eligibility was ignored because every candidate was cooling
    /// down (total-outage fallback).
    pub degraded: bool,
}

impl Selection {
    /// An empty selection (no provider has affinity for the tier).
    fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            degraded: false,
        }
    }
}

/// Chooses an ordered candidate list of providers for a requested tier.
#[derive(Debug)]
pub struct ServiceSelector {
    descriptors: Vec<ProviderDescriptor>,
    health: Arc<HealthTracker>,
}

impl ServiceSelector {
    /// Creates a selector over the registered descriptors.
    ///
    /// Fails fast on malformed registration: duplicate names or a descriptor
    /// with no tier affinity.
    pub fn new(
        descriptors: Vec<ProviderDescriptor>,
        health: Arc<HealthTracker>,
    ) -> Result<Self, RegistrationError> {
        let mut seen = std::collections::HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(RegistrationError::DuplicateProvider {
                    name: descriptor.name.clone(),
                });
            }
            if descriptor.tiers.is_empty() {
                return Err(RegistrationError::NoTierAffinity {
                    name: descriptor.name.clone(),
                });
            }
        }
        Ok(Self {
            descriptors,
            health,
        })
    }

    /// The registered descriptors, in registration order.
    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Ordered candidates for the given tier at `now`.
    pub async fn select(&self, tier: TaskTier, now: DateTime<Utc>) -> Selection {
        let affine: Vec<(usize, &ProviderDescriptor)> = self
            .descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.supports(tier))
            .collect();

        if affine.is_empty() {
            return Selection::empty();
        }

        let mut eligible = Vec::new();
        for &(index, descriptor) in &affine {
            if self.health.is_eligible(&descriptor.name, now).await {
                let errors = self.health.consecutive_errors(&descriptor.name).await;
                eligible.push((index, descriptor, errors));
            }
        }

        if eligible.is_empty() {
            // Total outage for this tier: try everyone anyway rather than
            // failing fast, and signal the degraded path.
            warn!(
                tier = %tier,
                candidates = affine.len(),
                "all tier-affine providers in cooldown; ignoring eligibility"
            );
            let mut candidates: Vec<(usize, &ProviderDescriptor)> = affine;
            candidates.sort_by_key(|&(index, d)| (d.cost_weight, index));
            return Selection {
                candidates: candidates.into_iter().map(|(_, d)| d.clone()).collect(),
                degraded: true,
            };
        }

        eligible.sort_by_key(|&(index, d, errors)| (d.cost_weight, errors, index));

        Selection {
            candidates: eligible.into_iter().map(|(_, d, _)| d.clone()).collect(),
            degraded: false,
        }
    }
}
