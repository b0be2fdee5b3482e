//! Avoidance gap detection
//!
//! Finds stretches of more than two days without any logging and flags the
//! longest one.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{round1, sorted_by_time, Concern, ConcernKind, Entry, Severity};

/// Minimum entries before gaps are meaningful
const MIN_ENTRIES: usize = 3;

/// Gaps longer than this many hours count as avoidance
const GAP_THRESHOLD_HOURS: f64 = 48.0;

/// Gaps longer than this many days are high severity
const HIGH_SEVERITY_DAYS: f64 = 7.0;

/// A stretch without logging between two consecutive entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceGap {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub duration_hours: f64,
}

impl AvoidanceGap {
    pub fn duration_days(&self) -> f64 {
        self.duration_hours / 24.0
    }
}

/// Result of the avoidance analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceAnalysis {
    /// Gaps over the threshold, in chronological order
    pub gaps: Vec<AvoidanceGap>,
    /// The longest gap, if any
    pub longest: Option<AvoidanceGap>,
    pub concerns: Vec<Concern>,
}

/// Detect gaps of more than 48 hours between consecutive entries
pub fn analyze_avoidance(entries: &[Entry]) -> AvoidanceAnalysis {
    if entries.len() < MIN_ENTRIES {
        return AvoidanceAnalysis::default();
    }

    let sorted = sorted_by_time(entries);

    let gaps: Vec<AvoidanceGap> = sorted
        .windows(2)
        .filter_map(|pair| {
            let hours = (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64
                / (1000.0 * 60.0 * 60.0);
            (hours > GAP_THRESHOLD_HOURS).then(|| AvoidanceGap {
                start: pair[0].timestamp,
                end: pair[1].timestamp,
                duration_hours: hours,
            })
        })
        .collect();

    // Earliest of equally long gaps wins
    let longest = gaps
        .iter()
        .fold(None::<&AvoidanceGap>, |best, gap| match best {
            Some(b) if b.duration_hours >= gap.duration_hours => Some(b),
            _ => Some(gap),
        })
        .cloned();

    let mut concerns = Vec::new();
    if let Some(gap) = &longest {
        let days = gap.duration_days();
        let severity = if days > HIGH_SEVERITY_DAYS {
            Severity::High
        } else {
            Severity::Medium
        };
        concerns.push(
            Concern::new(
                ConcernKind::Avoidance,
                severity,
                format!("Longest gap: {:.1} days without logging", round1(days)),
            )
            .with_details("Extended gaps may indicate avoidance behavior or low mood")
            .with_count(gaps.len()),
        );
    }

    debug!(
        entries = entries.len(),
        gaps = gaps.len(),
        longest_hours = longest.as_ref().map(|g| g.duration_hours),
        "avoidance analysis complete"
    );

    AvoidanceAnalysis {
        gaps,
        longest,
        concerns,
    }
}
