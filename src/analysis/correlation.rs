//! Pairwise metric correlation
//!
//! Pearson correlation between two numeric metrics using the sums formula:
//!
//! ```text
//! r = (nΣxy − ΣxΣy) / sqrt((nΣx² − (Σx)²)(nΣy² − (Σy)²))
//! ```
//!
//! Fewer than three paired samples is "insufficient data" (`None`), which is
//! distinct from a computed correlation of zero. Flat data (zero denominator)
//! resolves to zero.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Entry, Metric, MetricId, MetricKind};

/// |r| above this is a strong correlation
pub const STRONG_CORRELATION_THRESHOLD: f64 = 0.7;

/// |r| above this is moderate, for single-pair queries
pub const MODERATE_CORRELATION_THRESHOLD: f64 = 0.4;

/// |r| above this is moderate, for period summaries
pub const PERIOD_MODERATE_CORRELATION_THRESHOLD: f64 = 0.3;

/// |r| above this is worth surfacing when scanning all metric pairs
pub const REPORTABLE_CORRELATION_THRESHOLD: f64 = 0.5;

/// Paired samples needed for a correlation
const MIN_PAIRS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    /// Classify |r| against the strong threshold and a call-site specific
    /// moderate threshold
    pub fn classify(coefficient: f64, moderate_threshold: f64) -> Self {
        let magnitude = coefficient.abs();
        if magnitude > STRONG_CORRELATION_THRESHOLD {
            CorrelationStrength::Strong
        } else if magnitude > moderate_threshold {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

/// A computed correlation between two series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// Pearson coefficient in [-1, 1]
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    /// Number of paired samples
    pub sample_size: usize,
}

impl Correlation {
    fn new(coefficient: f64, sample_size: usize, moderate_threshold: f64) -> Self {
        Self {
            coefficient,
            strength: CorrelationStrength::classify(coefficient, moderate_threshold),
            direction: if coefficient > 0.0 {
                CorrelationDirection::Positive
            } else {
                CorrelationDirection::Negative
            },
            sample_size,
        }
    }

    /// Human-readable description, e.g. "Strong positive correlation"
    pub fn description(&self) -> String {
        let strength = match self.strength {
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => return "Weak correlation".to_string(),
        };
        let direction = match self.direction {
            CorrelationDirection::Positive => "positive",
            CorrelationDirection::Negative => "negative",
        };
        format!("{} {} correlation", strength, direction)
    }
}

/// A surfaced correlation between two registered metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCorrelation {
    pub metric_ids: [MetricId; 2],
    pub names: [String; 2],
    pub correlation: Correlation,
    pub description: String,
}

/// Pearson coefficient of paired samples.
///
/// `None` with fewer than three pairs; `Some(0.0)` when either series is flat.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < MIN_PAIRS {
        return None;
    }

    let n = pairs.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let variance_product = (n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y);

    // Cancellation can leave a tiny negative product for flat series
    if variance_product <= 0.0 {
        return Some(0.0);
    }

    let r = numerator / variance_product.sqrt();
    if !r.is_finite() {
        return Some(0.0);
    }
    Some(r.clamp(-1.0, 1.0))
}

/// Pairs of numeric values from entries that carry both metrics
pub fn paired_samples(entries: &[Entry], a: &MetricId, b: &MetricId) -> Vec<(f64, f64)> {
    entries
        .iter()
        .filter_map(|e| Some((e.number(a)?, e.number(b)?)))
        .collect()
}

fn correlate_with(
    entries: &[Entry],
    a: &MetricId,
    b: &MetricId,
    moderate_threshold: f64,
) -> Option<Correlation> {
    let pairs = paired_samples(entries, a, b);
    let coefficient = pearson(&pairs)?;
    Some(Correlation::new(coefficient, pairs.len(), moderate_threshold))
}

/// Correlate two metrics. `None` means insufficient paired data.
pub fn correlate_metrics(entries: &[Entry], a: &MetricId, b: &MetricId) -> Option<Correlation> {
    correlate_with(entries, a, b, MODERATE_CORRELATION_THRESHOLD)
}

/// Scan every pair of non-text metrics and keep correlations with
/// |r| > [`REPORTABLE_CORRELATION_THRESHOLD`].
///
/// `moderate_threshold` selects the classification used for the surfaced
/// results.
pub fn find_correlations(
    entries: &[Entry],
    metrics: &[Metric],
    moderate_threshold: f64,
) -> Vec<MetricCorrelation> {
    let candidates: Vec<&Metric> = metrics
        .iter()
        .filter(|m| m.kind() != MetricKind::Text)
        .collect();

    let mut found = Vec::new();
    for (i, first) in candidates.iter().enumerate() {
        for second in &candidates[i + 1..] {
            let Some(correlation) =
                correlate_with(entries, &first.id, &second.id, moderate_threshold)
            else {
                continue;
            };

            if correlation.coefficient.abs() > REPORTABLE_CORRELATION_THRESHOLD {
                found.push(MetricCorrelation {
                    metric_ids: [first.id.clone(), second.id.clone()],
                    names: [first.name.clone(), second.name.clone()],
                    description: correlation.description(),
                    correlation,
                });
            }
        }
    }

    debug!(
        candidates = candidates.len(),
        surfaced = found.len(),
        "correlation scan complete"
    );

    found
}
