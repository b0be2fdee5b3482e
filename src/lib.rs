//! Trackwise - On-device pattern detection for personal self-tracking data
//!
//! Trackwise analyzes timestamped entries of user-defined metrics (mood
//! scales, numbers, yes/no answers, emoji scales, notes) and produces an
//! insight report: time-of-day habits, bursts of rapid logging, gaps in
//! tracking, low completion, trends and correlations between metrics.
//!
//! ## Modules
//!
//! - **Analysis**: pure analyzers over entry snapshots
//! - **Report**: the insight report builder and configurable engine
//! - **Period**: summaries of a bounded time range
//! - **Store**: entry store and metric registry seams with in-memory implementations

pub mod analysis;
pub mod config;
pub mod error;
pub mod period;
pub mod report;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::InsightConfig;
pub use error::InsightError;
pub use report::{generate_insight_report, InsightEngine, InsightReport};

pub use period::{period_insights, PeriodInsights};
pub use store::{EntryStore, MemoryEntryStore, MemoryMetricRegistry, MetricRegistry};
pub use types::{
    parse_entries, parse_metrics, Concern, ConcernKind, Entry, EntryId, Metric, MetricId,
    MetricKind, MetricShape, Severity, Value,
};

/// Trackwise library version
pub const TRACKWISE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "trackwise";
