//! Provider routing - tiers, descriptors, health tracking, and selection.

mod descriptor;
mod health;
mod selector;
mod tier;

pub use descriptor::ProviderDescriptor;
pub use health::{BackoffPolicy, HealthTracker, ProviderHealth};
pub use selector::{Selection, ServiceSelector};
pub use tier::{ParseTierError, TaskTier};
