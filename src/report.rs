//! Insight report orchestration
//!
//! This module provides the public API for pattern detection. It runs the
//! analyzers over an entry snapshot and merges their concerns into one
//! severity-ordered report.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{
    aggregate_concerns, analyze_avoidance, analyze_completion_rates, analyze_rapid_logging,
    analyze_time_of_day, correlate_metrics, find_correlations, metric_statistics, metric_trend,
    AvoidanceAnalysis, CompletionAnalysis, Correlation, MetricCorrelation, MetricStatistics,
    MetricTrend, RapidLoggingAnalysis, TimeOfDayAnalysis,
};
use crate::analysis::correlation::MODERATE_CORRELATION_THRESHOLD;
use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::period::{period_insights, PeriodInsights};
use crate::store::{EntryStore, MetricRegistry};
use crate::types::{Concern, Entry, Metric, MetricId};

/// Full pattern-detection report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    /// Number of entries the report was built from
    pub entry_count: usize,
    /// False when there were too few entries to run the analyzers
    pub sufficient_data: bool,
    /// All concerns, most severe first
    pub concerns: Vec<Concern>,
    pub time_of_day: TimeOfDayAnalysis,
    pub rapid_logging: RapidLoggingAnalysis,
    pub completion: CompletionAnalysis,
    pub avoidance: AvoidanceAnalysis,
    /// Metric pairs with |r| above the surfacing threshold
    pub correlations: Vec<MetricCorrelation>,
}

impl InsightReport {
    /// Report for a snapshot too small to analyze
    pub fn insufficient(entry_count: usize) -> Self {
        Self {
            entry_count,
            sufficient_data: false,
            ..Default::default()
        }
    }

    /// Serialize the report to JSON
    pub fn to_json(&self) -> Result<String, InsightError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Build an insight report with the default configuration (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let report = generate_insight_report(&entries, &metrics);
/// for concern in &report.concerns {
///     println!("{:?}: {}", concern.severity, concern.message);
/// }
/// ```
pub fn generate_insight_report(entries: &[Entry], metrics: &[Metric]) -> InsightReport {
    InsightEngine::default().report(entries, metrics)
}

/// Insight engine carrying analyzer configuration.
///
/// Holds no state between calls: the same snapshot always yields the same
/// report.
#[derive(Debug, Clone, Default)]
pub struct InsightEngine {
    config: InsightConfig,
}

impl InsightEngine {
    /// Create an engine with a validated configuration
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Run every analyzer and aggregate the concerns
    pub fn report(&self, entries: &[Entry], metrics: &[Metric]) -> InsightReport {
        if entries.len() < self.config.min_entries_for_report {
            debug!(
                entries = entries.len(),
                required = self.config.min_entries_for_report,
                "too few entries for pattern detection"
            );
            return InsightReport::insufficient(entries.len());
        }

        let time_of_day = analyze_time_of_day(entries);
        let rapid_logging =
            analyze_rapid_logging(entries, self.config.rapid_logging_window_minutes);
        let completion = analyze_completion_rates(entries, metrics);
        let avoidance = analyze_avoidance(entries);

        let concerns = aggregate_concerns([
            time_of_day.concerns.clone(),
            rapid_logging.concerns.clone(),
            completion.concerns.clone(),
            avoidance.concerns.clone(),
        ]);

        let correlations = if self.config.surface_correlations {
            find_correlations(entries, metrics, MODERATE_CORRELATION_THRESHOLD)
        } else {
            Vec::new()
        };

        info!(
            entries = entries.len(),
            metrics = metrics.len(),
            concerns = concerns.len(),
            correlations = correlations.len(),
            "insight report generated"
        );

        InsightReport {
            entry_count: entries.len(),
            sufficient_data: true,
            concerns,
            time_of_day,
            rapid_logging,
            completion,
            avoidance,
            correlations,
        }
    }

    /// Build a report from a store and registry snapshot
    pub fn report_from_store(
        &self,
        store: &impl EntryStore,
        registry: &impl MetricRegistry,
    ) -> InsightReport {
        self.report(&store.list_entries(), &registry.list_metrics())
    }

    /// Moving-average trend of one metric using the configured window
    pub fn metric_trend(&self, entries: &[Entry], metric_id: &MetricId) -> Option<MetricTrend> {
        metric_trend(entries, metric_id, self.config.trend_window)
    }

    /// Trends for every metric that has enough numeric values
    pub fn metric_trends(&self, entries: &[Entry], metrics: &[Metric]) -> Vec<MetricTrend> {
        metrics
            .iter()
            .filter_map(|m| self.metric_trend(entries, &m.id))
            .collect()
    }

    /// Correlation between two metrics, `None` when there is too little data
    pub fn correlate(&self, entries: &[Entry], a: &MetricId, b: &MetricId) -> Option<Correlation> {
        correlate_metrics(entries, a, b)
    }

    /// Summary statistics for a metric
    pub fn statistics(&self, entries: &[Entry], metric: &Metric) -> Option<MetricStatistics> {
        metric_statistics(entries, metric)
    }

    /// Period insights over the store's entries within `[start, end]`
    pub fn period_report(
        &self,
        store: &impl EntryStore,
        registry: &impl MetricRegistry,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> PeriodInsights {
        let entries = store.list_entries_in_range(start, end);
        period_insights(&entries, &registry.list_metrics())
    }
}
