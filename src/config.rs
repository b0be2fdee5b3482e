//! Engine configuration
//!
//! Window sizes and sample-size minimums used when the report builder runs
//! the analyzers. Classification thresholds are fixed constants in the
//! analyzer modules and are not configurable.

use serde::{Deserialize, Serialize};

use crate::error::InsightError;

/// Default rapid-logging window in minutes
pub const DEFAULT_RAPID_LOGGING_WINDOW_MINUTES: u32 = 60;

/// Default trailing window (in samples) for moving-average trends
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// Minimum number of entries before full pattern detection runs
pub const DEFAULT_MIN_ENTRIES_FOR_REPORT: usize = 3;

/// Default cap on entries kept by the in-memory store
pub const DEFAULT_MAX_STORED_ENTRIES: usize = 100;

/// Insight engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Window for rapid-logging cluster detection, in minutes
    pub rapid_logging_window_minutes: u32,
    /// Sample window for moving-average trend detection
    pub trend_window: usize,
    /// Entries required before the report runs the analyzers
    pub min_entries_for_report: usize,
    /// Whether the report includes surfaced metric correlations
    pub surface_correlations: bool,
    /// History cap for the in-memory entry store
    pub max_stored_entries: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            rapid_logging_window_minutes: DEFAULT_RAPID_LOGGING_WINDOW_MINUTES,
            trend_window: DEFAULT_TREND_WINDOW,
            min_entries_for_report: DEFAULT_MIN_ENTRIES_FOR_REPORT,
            surface_correlations: true,
            max_stored_entries: DEFAULT_MAX_STORED_ENTRIES,
        }
    }
}

impl InsightConfig {
    /// Load configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, InsightError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings that would make the analyzers meaningless
    pub fn validate(&self) -> Result<(), InsightError> {
        if self.rapid_logging_window_minutes == 0 {
            return Err(InsightError::InvalidConfig(
                "rapid_logging_window_minutes must be at least 1".to_string(),
            ));
        }
        if self.trend_window == 0 {
            return Err(InsightError::InvalidConfig(
                "trend_window must be at least 1".to_string(),
            ));
        }
        if self.max_stored_entries == 0 {
            return Err(InsightError::InvalidConfig(
                "max_stored_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
