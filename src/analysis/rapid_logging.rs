//! Rapid-logging cluster detection
//!
//! A cluster starts at every entry and greedily grows over the following
//! entries that fall within the window of its first entry. Clusters are
//! sliding windows: consecutive starts produce overlapping clusters and they
//! are reported as-is, never merged into disjoint partitions.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{sorted_by_time, Concern, ConcernKind, Entry, Severity};

/// Entries a window must hold to count as a cluster
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Cluster size at which rapid logging becomes high severity
const HIGH_SEVERITY_CLUSTER_SIZE: usize = 5;

/// A burst of entries logged within one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RapidLoggingCluster {
    /// Timestamp of the first entry in the cluster
    pub start_time: DateTime<FixedOffset>,
    /// Number of entries in the cluster
    pub count: usize,
    /// Entries in chronological order
    pub entries: Vec<Entry>,
}

/// Result of the rapid-logging analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RapidLoggingAnalysis {
    /// Window used, in minutes
    pub window_minutes: u32,
    /// Qualifying clusters, one per qualifying start entry
    pub clusters: Vec<RapidLoggingCluster>,
    pub concerns: Vec<Concern>,
}

/// Find clusters of at least three entries logged within `window_minutes`
pub fn analyze_rapid_logging(entries: &[Entry], window_minutes: u32) -> RapidLoggingAnalysis {
    let mut analysis = RapidLoggingAnalysis {
        window_minutes,
        ..Default::default()
    };

    if entries.len() < 2 {
        return analysis;
    }

    let sorted = sorted_by_time(entries);
    let window = Duration::minutes(i64::from(window_minutes));

    for (i, start) in sorted.iter().enumerate() {
        let len = 1 + sorted[i + 1..]
            .iter()
            .take_while(|next| next.timestamp - start.timestamp <= window)
            .count();

        if len >= MIN_CLUSTER_SIZE {
            analysis.clusters.push(RapidLoggingCluster {
                start_time: start.timestamp,
                count: len,
                entries: sorted[i..i + len].iter().map(|e| (*e).clone()).collect(),
            });
        }
    }

    if !analysis.clusters.is_empty() {
        let severity = if analysis
            .clusters
            .iter()
            .any(|c| c.count >= HIGH_SEVERITY_CLUSTER_SIZE)
        {
            Severity::High
        } else {
            Severity::Medium
        };

        analysis.concerns.push(
            Concern::new(
                ConcernKind::RapidLogging,
                severity,
                format!(
                    "Found {} instance(s) of rapid logging ({}+ entries within {} min)",
                    analysis.clusters.len(),
                    MIN_CLUSTER_SIZE,
                    window_minutes
                ),
            )
            .with_details("May indicate compulsive checking, racing thoughts, or heightened anxiety")
            .with_count(analysis.clusters.len()),
        );
    }

    debug!(
        entries = entries.len(),
        window_minutes,
        clusters = analysis.clusters.len(),
        "rapid-logging analysis complete"
    );

    analysis
}
