//! Per-metric summary statistics

use serde::{Deserialize, Serialize};

use crate::types::{Entry, Metric, MetricKind};

/// Summary of a metric's logged values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricStatistics {
    Numeric {
        average: f64,
        /// Upper median: `sorted[n / 2]`
        median: f64,
        min: f64,
        max: f64,
        total_entries: usize,
    },
    Text {
        total_entries: usize,
    },
}

/// Summarize the values logged for `metric`.
///
/// Text metrics report only how many entries carry a note. Scales and numbers
/// use numeric coercion, emoji scales use the 1-based option position.
/// Booleans and multiple choice have no numeric summary. `None` when no usable
/// value exists.
pub fn metric_statistics(entries: &[Entry], metric: &Metric) -> Option<MetricStatistics> {
    if metric.kind() == MetricKind::Text {
        let total_entries = entries.iter().filter(|e| e.has_value(&metric.id)).count();
        return (total_entries > 0).then_some(MetricStatistics::Text { total_entries });
    }

    let mut values: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.value(&metric.id))
        .filter_map(|v| metric.numeric_value(v))
        .collect();

    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();

    Some(MetricStatistics::Numeric {
        average: values.iter().sum::<f64>() / n as f64,
        median: values[n / 2],
        min: values[0],
        max: values[n - 1],
        total_entries: n,
    })
}
