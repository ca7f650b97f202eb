//! Engine configuration
//!
//! Thresholds for cycle-length acceptance, the fallback cycle length, the
//! pattern recurrence threshold and the local hour reminders fire at.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EngineError;

/// Shortest interval accepted as a cycle length (days, inclusive)
pub const DEFAULT_MIN_CYCLE_DAYS: i64 = 20;

/// Longest interval accepted as a cycle length (days, inclusive)
pub const DEFAULT_MAX_CYCLE_DAYS: i64 = 40;

/// Cycle length assumed until at least one interval is observed
pub const DEFAULT_CYCLE_LENGTH_DAYS: f64 = 28.0;

/// Local hour reminders are delivered at
pub const DEFAULT_REMINDER_HOUR: u32 = 9;

/// Minimum number of distinct cycles before a pattern is reported
pub const DEFAULT_MIN_PATTERN_OCCURRENCES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_cycle_days: i64,
    pub max_cycle_days: i64,
    pub default_cycle_length_days: f64,
    pub reminder_hour: u32,
    pub min_pattern_occurrences: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_cycle_days: DEFAULT_MIN_CYCLE_DAYS,
            max_cycle_days: DEFAULT_MAX_CYCLE_DAYS,
            default_cycle_length_days: DEFAULT_CYCLE_LENGTH_DAYS,
            reminder_hour: DEFAULT_REMINDER_HOUR,
            min_pattern_occurrences: DEFAULT_MIN_PATTERN_OCCURRENCES,
        }
    }
}

impl EngineConfig {
    /// Check that the thresholds are coherent
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_cycle_days < 1 {
            return Err(EngineError::InvalidConfig(format!(
                "min_cycle_days must be positive, got {}",
                self.min_cycle_days
            )));
        }
        if self.min_cycle_days > self.max_cycle_days {
            return Err(EngineError::InvalidConfig(format!(
                "min_cycle_days ({}) exceeds max_cycle_days ({})",
                self.min_cycle_days, self.max_cycle_days
            )));
        }
        let default_length = self.default_cycle_length_days;
        if !default_length.is_finite()
            || default_length < self.min_cycle_days as f64
            || default_length > self.max_cycle_days as f64
        {
            return Err(EngineError::InvalidConfig(format!(
                "default_cycle_length_days must lie within {}-{} days, got {}",
                self.min_cycle_days, self.max_cycle_days, default_length
            )));
        }
        if self.reminder_hour > 23 {
            return Err(EngineError::InvalidConfig(format!(
                "reminder_hour must be 0-23, got {}",
                self.reminder_hour
            )));
        }
        // A pattern must recur; a single occurrence is never a pattern.
        if self.min_pattern_occurrences < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "min_pattern_occurrences must be at least 2, got {}",
                self.min_pattern_occurrences
            )));
        }
        Ok(())
    }

    /// Whether an interval between two anchors counts as a cycle length
    pub fn accepts_cycle_length(&self, days: i64) -> bool {
        days >= self.min_cycle_days && days <= self.max_cycle_days
    }

    /// Load and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let json = fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.accepts_cycle_length(20));
        assert!(config.accepts_cycle_length(28));
        assert!(config.accepts_cycle_length(40));
        assert!(!config.accepts_cycle_length(19));
        assert!(!config.accepts_cycle_length(41));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"reminder_hour": 8}"#).unwrap();
        assert_eq!(config.reminder_hour, 8);
        assert_eq!(config.min_cycle_days, DEFAULT_MIN_CYCLE_DAYS);
        assert_eq!(config.default_cycle_length_days, DEFAULT_CYCLE_LENGTH_DAYS);
    }

    #[test]
    fn test_rejects_single_occurrence_patterns() {
        let result = EngineConfig::from_json(r#"{"min_pattern_occurrences": 1}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let config = EngineConfig {
            min_cycle_days: 35,
            max_cycle_days: 21,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_length_must_be_an_accepted_cycle() {
        let result = EngineConfig::from_json(r#"{"default_cycle_length_days": 1e12}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));

        let result = EngineConfig::from_json(r#"{"default_cycle_length_days": 19.5}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));

        let config =
            EngineConfig::from_json(r#"{"default_cycle_length_days": 40, "max_cycle_days": 45}"#)
                .unwrap();
        assert_eq!(config.default_cycle_length_days, 40.0);
    }

    #[test]
    fn test_rejects_bad_hour() {
        let config = EngineConfig {
            reminder_hour: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EngineConfig {
            reminder_hour: 7,
            ..Default::default()
        };
        let loaded = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }
}
