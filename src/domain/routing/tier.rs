//! Task tiers - coarse classification of how demanding a request is.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How demanding/complex a request is, used to choose eligible providers.
///
/// Ordinal: `Basic < Standard < Complex < Research`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskTier {
    Basic,
    Standard,
    Complex,
    Research,
}

impl TaskTier {
    /// All tiers in ascending order.
    pub fn all() -> [TaskTier; 4] {
        [
            TaskTier::Basic,
            TaskTier::Standard,
            TaskTier::Complex,
            TaskTier::Research,
        ]
    }
}

impl std::fmt::Display for TaskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TaskTier::Basic => "basic",
            TaskTier::Standard => "standard",
            TaskTier::Complex => "complex",
            TaskTier::Research => "research",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for TaskTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(TaskTier::Basic),
            "standard" => Ok(TaskTier::Standard),
            "complex" => Ok(TaskTier::Complex),
            "research" => Ok(TaskTier::Research),
            other => Err(ParseTierError(other.to_string())),
        }
    }
}

/// Error for unrecognized tier names.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown task tier: {0}")]
pub struct ParseTierError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(TaskTier::Basic < TaskTier::Standard);
        assert!(TaskTier::Standard < TaskTier::Complex);
        assert!(TaskTier::Complex < TaskTier::Research);
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("STANDARD".parse::<TaskTier>().unwrap(), TaskTier::Standard);
        assert_eq!("research".parse::<TaskTier>().unwrap(), TaskTier::Research);
        assert!("ultra".parse::<TaskTier>().is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&TaskTier::Complex).unwrap();
        assert_eq!(json, "\"complex\"");
    }
}
