//! AI provider configuration
//!
//! Providers are declared as a static list at startup. Each entry names one
//! callable provider/model pair together with its routing metadata (tier
//! affinity, cost weight, soft request quota) and connection parameters.

use secrecy::Secret;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::routing::{ProviderDescriptor, TaskTier};

/// AI provider configuration
#[derive(Debug, Deserialize)]
pub struct AiConfig {
    /// Registered providers, in preference registration order
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,

    /// Per-call timeout in seconds applied to each provider attempt
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

/// One registered provider/model pair
#[derive(Debug, Deserialize)]
pub struct ProviderEntry {
    /// Unique provider name (e.g. "gemini-flash")
    pub name: String,

    /// Which adapter implementation to construct
    pub kind: ProviderKind,

    /// API key, required for non-mock providers
    pub api_key: Option<Secret<String>>,

    /// Model identifier passed to the provider API
    pub model: String,

    /// Task tiers this provider is suitable for
    pub tiers: Vec<TaskTier>,

    /// Relative cost unit for selection tie-breaking (lower is preferred)
    #[serde(default = "default_cost_weight")]
    pub cost_weight: u32,

    /// Soft requests-per-minute quota, surfaced in health snapshots
    #[serde(default = "default_rpm")]
    pub max_requests_per_minute: u32,
}

/// Provider adapter type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Openrouter,
    Mock,
}

impl AiConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Build routing descriptors from the configured provider entries
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers
            .iter()
            .map(|p| {
                ProviderDescriptor::new(
                    &p.name,
                    p.tiers.clone(),
                    p.cost_weight,
                    p.max_requests_per_minute,
                )
            })
            .collect()
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.providers.is_empty() {
            return Err(ValidationError::NoProviderConfigured);
        }
        if self.call_timeout_secs == 0 || self.call_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.name.as_str()) {
                return Err(ValidationError::DuplicateProvider(provider.name.clone()));
            }
            if provider.tiers.is_empty() {
                return Err(ValidationError::NoTierAffinity(provider.name.clone()));
            }
            if provider.kind != ProviderKind::Mock && provider.api_key.is_none() {
                return Err(ValidationError::MissingApiKey(provider.name.clone()));
            }
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

fn default_call_timeout() -> u64 {
    30
}

fn default_cost_weight() -> u32 {
    1
}

fn default_rpm() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: ProviderKind, tiers: Vec<TaskTier>) -> ProviderEntry {
        ProviderEntry {
            name: name.to_string(),
            kind,
            api_key: Some(Secret::new("key-xxx".to_string())),
            model: "test-model".to_string(),
            tiers,
            cost_weight: 1,
            max_requests_per_minute: 60,
        }
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.call_timeout_secs, 30);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_call_timeout_duration() {
        let config = AiConfig {
            providers: vec![],
            call_timeout_secs: 45,
        };
        assert_eq!(config.call_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_validation_no_providers() {
        let config = AiConfig {
            providers: vec![],
            call_timeout_secs: 30,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NoProviderConfigured)
        ));
    }

    #[test]
    fn test_validation_duplicate_names() {
        let config = AiConfig {
            providers: vec![
                entry("gemini", ProviderKind::Gemini, vec![TaskTier::Basic]),
                entry("gemini", ProviderKind::Openrouter, vec![TaskTier::Standard]),
            ],
            call_timeout_secs: 30,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::DuplicateProvider(_))
        ));
    }

    #[test]
    fn test_validation_empty_tiers() {
        let config = AiConfig {
            providers: vec![entry("gemini", ProviderKind::Gemini, vec![])],
            call_timeout_secs: 30,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NoTierAffinity(_))
        ));
    }

    #[test]
    fn test_validation_missing_api_key() {
        let mut provider = entry("gemini", ProviderKind::Gemini, vec![TaskTier::Basic]);
        provider.api_key = None;
        let config = AiConfig {
            providers: vec![provider],
            call_timeout_secs: 30,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_validation_mock_needs_no_key() {
        let mut provider = entry("fake", ProviderKind::Mock, vec![TaskTier::Basic]);
        provider.api_key = None;
        let config = AiConfig {
            providers: vec![provider],
            call_timeout_secs: 30,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_descriptors_preserve_registration_order() {
        let config = AiConfig {
            providers: vec![
                entry("first", ProviderKind::Mock, vec![TaskTier::Basic]),
                entry("second", ProviderKind::Mock, vec![TaskTier::Standard]),
            ],
            call_timeout_secs: 30,
        };
        let descriptors = config.descriptors();
        assert_eq!(descriptors[0].name, "first");
        assert_eq!(descriptors[1].name, "second");
    }
}
