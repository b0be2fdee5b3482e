//! Trend detection
//!
//! Two trend algorithms with different call sites. They are not equivalent
//! and must stay separate:
//!
//! - [`metric_trend`]: compares the trailing `window` values of one metric
//!   against the `window` values before them, using an absolute threshold of
//!   one unit.
//! - [`period_trend`]: splits a period's values in half and compares the
//!   averages by percentage change, using a ±10% threshold.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Entry, MetricId};

/// Absolute change in averages needed for a moving-average trend
const ABSOLUTE_TREND_THRESHOLD: f64 = 1.0;

/// Percentage change needed for a period trend
const PERCENT_TREND_THRESHOLD: f64 = 10.0;

/// Values required before any trend is reported
const MIN_TREND_VALUES: usize = 2;

/// Direction of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Moving-average trend for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub metric_id: MetricId,
    /// Most recent value
    pub current: f64,
    /// Average of the trailing window
    pub recent_average: f64,
    /// Average of the window before it (equal to the recent average if empty)
    pub older_average: f64,
    /// `recent_average - older_average`
    pub change: f64,
    pub direction: TrendDirection,
    /// Number of numeric values found
    pub sample_size: usize,
    pub window_size: usize,
    /// Trailing moving average at each value
    pub moving_average: Vec<f64>,
}

/// Half-split percentage trend over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTrend {
    pub direction: TrendDirection,
    /// Percentage change from the first half to the second, `None` when the
    /// first half averages zero
    pub change_percent: Option<f64>,
    /// Average of the second half
    pub current_average: f64,
    /// Average of the first half
    pub previous_average: f64,
}

/// Numeric values of a metric in chronological order
pub(crate) fn numeric_series(
    entries: &[Entry],
    metric_id: &MetricId,
) -> Vec<(DateTime<FixedOffset>, f64)> {
    let mut values: Vec<(DateTime<FixedOffset>, f64)> = entries
        .iter()
        .filter_map(|e| e.number(metric_id).map(|v| (e.timestamp, v)))
        .collect();
    values.sort_by_key(|(ts, _)| *ts);
    values
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn trailing_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| mean(&values[(i + 1).saturating_sub(window)..=i]))
        .collect()
}

/// Moving-average trend of one metric.
///
/// Returns `None` when fewer than two numeric values exist or `window_size`
/// is zero.
pub fn metric_trend(
    entries: &[Entry],
    metric_id: &MetricId,
    window_size: usize,
) -> Option<MetricTrend> {
    if window_size == 0 {
        return None;
    }

    let values: Vec<f64> = numeric_series(entries, metric_id)
        .into_iter()
        .map(|(_, v)| v)
        .collect();

    if values.len() < MIN_TREND_VALUES {
        debug!(metric = %metric_id, values = values.len(), "not enough values for trend");
        return None;
    }

    let n = values.len();
    let recent_start = n.saturating_sub(window_size);
    let older_start = recent_start.saturating_sub(window_size);

    let recent = &values[recent_start..];
    let older = &values[older_start..recent_start];

    let recent_average = mean(recent);
    let older_average = if older.is_empty() {
        recent_average
    } else {
        mean(older)
    };

    let change = recent_average - older_average;
    let direction = if change > ABSOLUTE_TREND_THRESHOLD {
        TrendDirection::Increasing
    } else if change < -ABSOLUTE_TREND_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    Some(MetricTrend {
        metric_id: metric_id.clone(),
        current: values[n - 1],
        recent_average,
        older_average,
        change,
        direction,
        sample_size: n,
        window_size,
        moving_average: trailing_moving_average(&values, window_size),
    })
}

/// Half-split percentage trend over chronologically ordered values.
///
/// Returns `None` for fewer than two values.
pub fn period_trend(values: &[f64]) -> Option<PeriodTrend> {
    if values.len() < MIN_TREND_VALUES {
        return None;
    }

    let midpoint = values.len() / 2;
    let previous_average = mean(&values[..midpoint]);
    let current_average = mean(&values[midpoint..]);

    let (direction, change_percent) = if previous_average == 0.0 {
        let direction = if current_average > 0.0 {
            TrendDirection::Increasing
        } else if current_average < 0.0 {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };
        (direction, None)
    } else {
        let change = (current_average - previous_average) / previous_average * 100.0;
        let direction = if change > PERCENT_TREND_THRESHOLD {
            TrendDirection::Increasing
        } else if change < -PERCENT_TREND_THRESHOLD {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };
        (direction, Some(change))
    };

    Some(PeriodTrend {
        direction,
        change_percent,
        current_average,
        previous_average,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{entry_at_minutes, numeric_series as series};
    use crate::types::Value;
    use pretty_assertions::assert_eq;

    fn mood() -> MetricId {
        MetricId::from("mood")
    }

    #[test]
    fn test_increasing_mood_window_four() {
        let entries = series("mood", &[3.0, 4.0, 3.0, 4.0, 8.0, 9.0, 8.0, 9.0]);
        let trend = metric_trend(&entries, &mood(), 4).unwrap();

        assert_eq!(trend.older_average, 3.5);
        assert_eq!(trend.recent_average, 8.5);
        assert_eq!(trend.change, 5.0);
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert_eq!(trend.current, 9.0);
        assert_eq!(trend.sample_size, 8);
    }

    #[test]
    fn test_decreasing_and_stable() {
        let entries = series("mood", &[8.0, 8.0, 3.0, 3.0]);
        let trend = metric_trend(&entries, &mood(), 2).unwrap();
        assert_eq!(trend.direction, TrendDirection::Decreasing);

        // A one unit change is not enough
        let entries = series("mood", &[4.0, 4.0, 5.0, 5.0]);
        let trend = metric_trend(&entries, &mood(), 2).unwrap();
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_empty_older_window_is_stable() {
        let entries = series("mood", &[1.0, 9.0]);
        let trend = metric_trend(&entries, &mood(), 7).unwrap();
        assert_eq!(trend.older_average, trend.recent_average);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_short_older_window() {
        // window 3 over 5 values: recent = [6, 7, 8], older = [1, 2]
        let entries = series("mood", &[1.0, 2.0, 6.0, 7.0, 8.0]);
        let trend = metric_trend(&entries, &mood(), 3).unwrap();
        assert_eq!(trend.older_average, 1.5);
        assert_eq!(trend.recent_average, 7.0);
    }

    #[test]
    fn test_insufficient_data() {
        let entries = series("mood", &[5.0]);
        assert!(metric_trend(&entries, &mood(), 7).is_none());
        assert!(metric_trend(&series("mood", &[1.0, 2.0]), &mood(), 0).is_none());
        assert!(metric_trend(&entries, &MetricId::from("other"), 7).is_none());
    }

    #[test]
    fn test_non_numeric_values_are_skipped() {
        let mut entries = series("mood", &[2.0, 2.0]);
        entries.push(entry_at_minutes(10, 600).with_value("mood", Value::Text("meh".to_string())));
        entries.push(entry_at_minutes(11, 660).with_value("mood", Value::Text("6".to_string())));

        let trend = metric_trend(&entries, &mood(), 7).unwrap();
        assert_eq!(trend.sample_size, 3);
        assert_eq!(trend.current, 6.0);
    }

    #[test]
    fn test_sorts_by_timestamp() {
        let mut entries = series("mood", &[1.0, 2.0, 3.0]);
        entries.reverse();
        let trend = metric_trend(&entries, &mood(), 7).unwrap();
        assert_eq!(trend.current, 3.0);
    }

    #[test]
    fn test_moving_average() {
        let entries = series("mood", &[2.0, 4.0, 6.0, 8.0]);
        let trend = metric_trend(&entries, &mood(), 2).unwrap();
        assert_eq!(trend.moving_average, vec![2.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_trend_is_idempotent() {
        let entries = series("mood", &[3.0, 5.0, 2.0, 8.0, 6.0, 7.0]);
        let first = metric_trend(&entries, &mood(), 3);
        let second = metric_trend(&entries, &mood(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_period_trend_percentage() {
        let trend = period_trend(&[5.0, 5.0, 6.0, 6.0]).unwrap();
        assert_eq!(trend.previous_average, 5.0);
        assert_eq!(trend.current_average, 6.0);
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert!((trend.change_percent.unwrap() - 20.0).abs() < 1e-9);

        // Odd length: the second half takes the extra value
        let trend = period_trend(&[10.0, 10.0, 10.5]).unwrap();
        assert_eq!(trend.previous_average, 10.0);
        assert_eq!(trend.current_average, 10.25);
        assert_eq!(trend.direction, TrendDirection::Stable);

        let trend = period_trend(&[10.0, 8.0]).unwrap();
        assert_eq!(trend.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_period_trend_differs_from_metric_trend() {
        // +0.9 absolute is stable for the moving average but +18% for the period
        let values = [5.0, 5.0, 5.9, 5.9];
        let period = period_trend(&values).unwrap();
        assert_eq!(period.direction, TrendDirection::Increasing);

        let entries = series("mood", &values);
        let moving = metric_trend(&entries, &mood(), 2).unwrap();
        assert_eq!(moving.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_period_trend_zero_baseline() {
        let trend = period_trend(&[0.0, 0.0, 3.0]).unwrap();
        assert_eq!(trend.change_percent, None);
        assert_eq!(trend.direction, TrendDirection::Increasing);

        let trend = period_trend(&[0.0, 0.0]).unwrap();
        assert_eq!(trend.direction, TrendDirection::Stable);

        assert!(period_trend(&[1.0]).is_none());
    }
}
