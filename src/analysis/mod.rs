//! Pattern detection analyzers
//!
//! Every analyzer is a pure function over a snapshot of entries (and metrics
//! where needed). None of them fail: too little data yields an empty result or
//! `None`.
//!
//! Temporal: time-of-day distribution, rapid-logging clusters, avoidance gaps.
//! Statistical: completion rates, trends, correlations, summary statistics.

pub mod avoidance;
pub mod completion;
pub mod concerns;
pub mod correlation;
pub mod rapid_logging;
pub mod summary;
pub mod time_of_day;
pub mod trend;

pub use avoidance::{analyze_avoidance, AvoidanceAnalysis, AvoidanceGap};
pub use completion::{analyze_completion_rates, CompletionAnalysis, CompletionRate};
pub use concerns::aggregate_concerns;
pub use correlation::{
    correlate_metrics, find_correlations, pearson, Correlation, CorrelationDirection,
    CorrelationStrength, MetricCorrelation,
};
pub use rapid_logging::{analyze_rapid_logging, RapidLoggingAnalysis, RapidLoggingCluster};
pub use summary::{metric_statistics, MetricStatistics};
pub use time_of_day::{analyze_time_of_day, TimeBucket, TimeOfDayAnalysis};
pub use trend::{metric_trend, period_trend, MetricTrend, PeriodTrend, TrendDirection};
