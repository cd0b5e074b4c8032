//! Dispatch configuration
//!
//! Tunables for the intent-vs-AI decision: acceptance threshold, ambiguity
//! margin, session turn capacity, and the degraded reply used when every
//! provider is exhausted.

use serde::Deserialize;

use super::error::ValidationError;

/// Dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Minimum confidence for a matched intent to bypass the AI path
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,

    /// Minimum confidence gap between the best and second-best match
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Maximum recent turns kept in a session context
    #[serde(default = "default_max_recent_turns")]
    pub max_recent_turns: usize,

    /// Static reply returned when all providers are exhausted
    #[serde(default = "default_degraded_reply")]
    pub degraded_reply: String,
}

impl DispatchConfig {
    /// Validate dispatch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.accept_threshold) || self.accept_threshold == 0.0 {
            return Err(ValidationError::InvalidThreshold);
        }
        if self.margin < 0.0 || self.margin >= self.accept_threshold {
            return Err(ValidationError::InvalidMargin);
        }
        if self.max_recent_turns < 2 {
            return Err(ValidationError::InvalidTurnCapacity);
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            accept_threshold: default_accept_threshold(),
            margin: default_margin(),
            max_recent_turns: default_max_recent_turns(),
            degraded_reply: default_degraded_reply(),
        }
    }
}

fn default_accept_threshold() -> f64 {
    0.75
}

fn default_margin() -> f64 {
    0.1
}

fn default_max_recent_turns() -> usize {
    12
}

fn default_degraded_reply() -> String {
    "I'm having trouble responding right now. Please try again in a moment.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.accept_threshold, 0.75);
        assert_eq!(config.margin, 0.1);
        assert_eq!(config.max_recent_turns, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_threshold_out_of_range() {
        let config = DispatchConfig {
            accept_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidThreshold)
        ));
    }

    #[test]
    fn test_validation_margin_exceeds_threshold() {
        let config = DispatchConfig {
            accept_threshold: 0.5,
            margin: 0.6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMargin)
        ));
    }

    #[test]
    fn test_validation_turn_capacity_too_small() {
        let config = DispatchConfig {
            max_recent_turns: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTurnCapacity)
        ));
    }
}
