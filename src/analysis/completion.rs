//! Per-metric completion rates

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{round1, Concern, ConcernKind, Entry, Metric, MetricId, Severity};

/// Rates below this percentage are flagged
const LOW_COMPLETION_PERCENT: f64 = 50.0;

/// Entries required before low completion is flagged
const LOW_COMPLETION_MIN_ENTRIES: usize = 5;

/// How often a metric was filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRate {
    pub metric_id: MetricId,
    pub name: String,
    /// Percentage of entries containing the metric, one decimal
    pub rate: f64,
    /// Number of entries containing the metric
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionAnalysis {
    /// One rate per metric, in registry order
    pub rates: Vec<CompletionRate>,
    pub concerns: Vec<Concern>,
}

impl CompletionAnalysis {
    pub fn rate(&self, metric_id: &MetricId) -> Option<&CompletionRate> {
        self.rates.iter().find(|r| &r.metric_id == metric_id)
    }
}

/// Compute the share of entries that contain each metric
pub fn analyze_completion_rates(entries: &[Entry], metrics: &[Metric]) -> CompletionAnalysis {
    if entries.is_empty() {
        return CompletionAnalysis::default();
    }

    let total = entries.len();
    let mut analysis = CompletionAnalysis::default();

    for metric in metrics {
        let count = entries.iter().filter(|e| e.has_value(&metric.id)).count();
        let rate = count as f64 / total as f64 * 100.0;

        analysis.rates.push(CompletionRate {
            metric_id: metric.id.clone(),
            name: metric.name.clone(),
            rate: round1(rate),
            count,
        });

        if rate < LOW_COMPLETION_PERCENT && total >= LOW_COMPLETION_MIN_ENTRIES {
            analysis.concerns.push(
                Concern::new(
                    ConcernKind::LowCompletion,
                    Severity::Low,
                    format!(
                        "{} only tracked in {:.0}% of entries",
                        metric.name,
                        rate.round()
                    ),
                )
                .with_metric(metric.id.clone())
                .with_count(count),
            );
        }
    }

    debug!(
        entries = total,
        metrics = metrics.len(),
        low_completion = analysis.concerns.len(),
        "completion analysis complete"
    );

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::entry_at_minutes;
    use crate::types::{MetricKind, Value};

    fn metrics() -> Vec<Metric> {
        vec![
            Metric::new("mood", "Mood", MetricKind::Scale),
            Metric::new("sleep", "Hours of Sleep", MetricKind::Number),
        ]
    }

    fn entries(n: usize, with_sleep: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| {
                let entry = entry_at_minutes(i, i as i64 * 600)
                    .with_value("mood", Value::Number(5.0));
                if i < with_sleep {
                    entry.with_value("sleep", Value::Number(7.0))
                } else {
                    entry
                }
            })
            .collect()
    }

    #[test]
    fn test_empty_entries() {
        let analysis = analyze_completion_rates(&[], &metrics());
        assert!(analysis.rates.is_empty());
        assert!(analysis.concerns.is_empty());
    }

    #[test]
    fn test_rates_rounded_to_one_decimal() {
        let analysis = analyze_completion_rates(&entries(3, 1), &metrics());

        let mood = analysis.rate(&MetricId::from("mood")).unwrap();
        assert_eq!(mood.rate, 100.0);
        assert_eq!(mood.count, 3);

        let sleep = analysis.rate(&MetricId::from("sleep")).unwrap();
        assert_eq!(sleep.rate, 33.3);
        assert_eq!(sleep.count, 1);

        // Fewer than five entries: no concern even at 33%
        assert!(analysis.concerns.is_empty());
    }

    #[test]
    fn test_low_completion_concern() {
        let analysis = analyze_completion_rates(&entries(6, 2), &metrics());

        assert_eq!(analysis.concerns.len(), 1);
        let concern = &analysis.concerns[0];
        assert_eq!(concern.kind, ConcernKind::LowCompletion);
        assert_eq!(concern.severity, Severity::Low);
        assert_eq!(concern.metric_id, Some(MetricId::from("sleep")));
        assert_eq!(concern.message, "Hours of Sleep only tracked in 33% of entries");
    }

    #[test]
    fn test_message_rounds_half_percent_up() {
        let analysis = analyze_completion_rates(&entries(8, 1), &metrics());

        let sleep = analysis.rate(&MetricId::from("sleep")).unwrap();
        assert_eq!(sleep.rate, 12.5);
        assert_eq!(
            analysis.concerns[0].message,
            "Hours of Sleep only tracked in 13% of entries"
        );
    }

    #[test]
    fn test_exactly_half_is_not_low() {
        let analysis = analyze_completion_rates(&entries(6, 3), &metrics());
        assert!(analysis.concerns.is_empty());
    }

    #[test]
    fn test_values_for_unknown_metrics_are_ignored() {
        let entries: Vec<Entry> = (0..5)
            .map(|i| entry_at_minutes(i, i as i64).with_value("ghost", Value::Boolean(true)))
            .collect();
        let analysis = analyze_completion_rates(&entries, &metrics());
        assert_eq!(analysis.rates.len(), 2);
        assert!(analysis.rates.iter().all(|r| r.count == 0));
        assert_eq!(analysis.concerns.len(), 2);
    }
}
