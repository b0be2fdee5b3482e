//! Core data types
//!
//! This module defines the entries, metrics and concerns that flow through the
//! insights engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InsightError;

/// Opaque metric identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(pub String);

impl MetricId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random metric id
    pub fn generate() -> Self {
        Self(format!("metric_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque entry identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Generate a fresh random entry id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single logged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Choice(String),
}

impl Value {
    /// Coerce the value to a number.
    ///
    /// Numbers pass through when finite, text and choices are parsed after
    /// trimming, booleans never coerce. Anything that does not yield a finite
    /// number is `None` so numeric analyzers can skip it silently.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => *n,
            Value::Text(s) | Value::Choice(s) => s.trim().parse::<f64>().ok()?,
            Value::Boolean(_) => return None,
        };
        n.is_finite().then_some(n)
    }
}

/// One timestamped submission of metric values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry identifier
    pub id: EntryId,
    /// When the entry was logged, in the offset it was logged from
    pub timestamp: DateTime<FixedOffset>,
    /// Logged values keyed by metric
    #[serde(default)]
    pub values: BTreeMap<MetricId, Value>,
}

impl Entry {
    /// Create an entry with a generated id
    pub fn new(timestamp: DateTime<FixedOffset>, values: BTreeMap<MetricId, Value>) -> Self {
        Self {
            id: EntryId::generate(),
            timestamp,
            values,
        }
    }

    /// Builder-style helper to add a value
    pub fn with_value(mut self, metric: impl Into<MetricId>, value: Value) -> Self {
        self.values.insert(metric.into(), value);
        self
    }

    pub fn value(&self, metric: &MetricId) -> Option<&Value> {
        self.values.get(metric)
    }

    pub fn has_value(&self, metric: &MetricId) -> bool {
        self.values.contains_key(metric)
    }

    /// Numeric value for a metric, if present and coercible
    pub fn number(&self, metric: &MetricId) -> Option<f64> {
        self.value(metric).and_then(Value::as_number)
    }
}

/// Parse entries from a JSON array or newline-delimited JSON.
///
/// Blank NDJSON lines are skipped; a malformed line fails the whole parse with
/// its 1-based line number.
pub fn parse_entries(input: &str) -> Result<Vec<Entry>, InsightError> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| InsightError::ParseError(format!("line {}: {}", i + 1, e)))
        })
        .collect()
}

/// Parse metric definitions from a JSON array
pub fn parse_metrics(input: &str) -> Result<Vec<Metric>, InsightError> {
    Ok(serde_json::from_str(input)?)
}

/// Kind of a tracked metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Scale,
    Number,
    Boolean,
    Emoji,
    Text,
    MultiChoice,
}

impl MetricKind {
    /// Default shape for a newly created metric of this kind
    pub fn default_shape(self, name: &str) -> MetricShape {
        match self {
            MetricKind::Scale => MetricShape::Scale {
                min: 1.0,
                max: 10.0,
                step: 1.0,
            },
            MetricKind::Number => MetricShape::Number {
                min: 0.0,
                max: 100.0,
                step: 0.5,
                unit: String::new(),
            },
            MetricKind::Boolean => MetricShape::Boolean {
                label: Some(name.to_string()),
            },
            MetricKind::Emoji => MetricShape::Emoji {
                options: ["😢", "😐", "🙂", "😊", "😄"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            MetricKind::Text => MetricShape::Text {
                max_length: DEFAULT_TEXT_MAX_LENGTH,
            },
            MetricKind::MultiChoice => MetricShape::MultiChoice {
                options: (1..=3).map(|i| format!("Option {}", i)).collect(),
            },
        }
    }
}

/// Default maximum length of a text note
pub const DEFAULT_TEXT_MAX_LENGTH: usize = 200;

fn default_step() -> f64 {
    1.0
}

fn default_text_max_length() -> usize {
    DEFAULT_TEXT_MAX_LENGTH
}

/// Bounds or option set of a metric, depending on its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricShape {
    Scale {
        min: f64,
        max: f64,
        #[serde(default = "default_step")]
        step: f64,
    },
    Number {
        min: f64,
        max: f64,
        #[serde(default = "default_step")]
        step: f64,
        #[serde(default)]
        unit: String,
    },
    Boolean {
        #[serde(default)]
        label: Option<String>,
    },
    Emoji {
        options: Vec<String>,
    },
    Text {
        #[serde(default = "default_text_max_length")]
        max_length: usize,
    },
    MultiChoice {
        options: Vec<String>,
    },
}

/// A user-defined tracked quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub name: String,
    #[serde(flatten)]
    pub shape: MetricShape,
}

impl Metric {
    /// Create a metric with the default shape for its kind
    pub fn new(id: impl Into<MetricId>, name: impl Into<String>, kind: MetricKind) -> Self {
        let name = name.into();
        let shape = kind.default_shape(&name);
        Self {
            id: id.into(),
            name,
            shape,
        }
    }

    pub fn with_shape(mut self, shape: MetricShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn kind(&self) -> MetricKind {
        match self.shape {
            MetricShape::Scale { .. } => MetricKind::Scale,
            MetricShape::Number { .. } => MetricKind::Number,
            MetricShape::Boolean { .. } => MetricKind::Boolean,
            MetricShape::Emoji { .. } => MetricKind::Emoji,
            MetricShape::Text { .. } => MetricKind::Text,
            MetricShape::MultiChoice { .. } => MetricKind::MultiChoice,
        }
    }

    /// Numeric interpretation of a logged value for summary statistics.
    ///
    /// Emoji values map to their 1-based option position. Booleans, text and
    /// multiple choice have no numeric reading.
    pub fn numeric_value(&self, value: &Value) -> Option<f64> {
        match &self.shape {
            MetricShape::Scale { .. } | MetricShape::Number { .. } => value.as_number(),
            MetricShape::Emoji { options } => match value {
                Value::Choice(s) | Value::Text(s) => options
                    .iter()
                    .position(|o| o == s)
                    .map(|i| (i + 1) as f64),
                _ => None,
            },
            MetricShape::Boolean { .. }
            | MetricShape::Text { .. }
            | MetricShape::MultiChoice { .. } => None,
        }
    }

    /// Check a value against this metric's bounds or option set
    pub fn validate_value(&self, value: &Value) -> Result<(), InsightError> {
        let invalid = |reason: String| InsightError::InvalidValue {
            metric: self.name.clone(),
            reason,
        };

        match (&self.shape, value) {
            (MetricShape::Scale { min, max, .. }, _) | (MetricShape::Number { min, max, .. }, _) => {
                let n = value
                    .as_number()
                    .ok_or_else(|| invalid("expected a number".to_string()))?;
                if n < *min || n > *max {
                    return Err(invalid(format!("{} is outside {}..={}", n, min, max)));
                }
                Ok(())
            }
            (MetricShape::Boolean { .. }, Value::Boolean(_)) => Ok(()),
            (MetricShape::Text { max_length }, Value::Text(s)) => {
                if s.chars().count() > *max_length {
                    return Err(invalid(format!(
                        "text is longer than {} characters",
                        max_length
                    )));
                }
                Ok(())
            }
            (MetricShape::Emoji { options }, Value::Choice(s))
            | (MetricShape::MultiChoice { options }, Value::Choice(s)) => {
                if options.iter().any(|o| o == s) {
                    Ok(())
                } else {
                    Err(invalid(format!("'{}' is not one of the options", s)))
                }
            }
            (_, other) => Err(invalid(format!(
                "{:?} value does not match a {:?} metric",
                other,
                self.kind()
            ))),
        }
    }
}

/// Severity of a flagged concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank, most severe first
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }
}

/// Kind of behavioral pattern a concern flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernKind {
    LateNightActivity,
    MorningAvoidance,
    RapidLogging,
    LowCompletion,
    Avoidance,
}

/// A flagged behavioral pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    pub kind: ConcernKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_id: Option<MetricId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Concern {
    pub fn new(kind: ConcernKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            details: None,
            metric_id: None,
            count: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_metric(mut self, metric_id: MetricId) -> Self {
        self.metric_id = Some(metric_id);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Sort timestamps-first copy of the entries
pub(crate) fn sorted_by_time(entries: &[Entry]) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);
    sorted
}

/// Number of distinct calendar days, in each entry's recorded offset
pub(crate) fn distinct_days<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> usize {
    entries
        .into_iter()
        .map(|e| e.timestamp.date_naive())
        .collect::<BTreeSet<NaiveDate>>()
        .len()
}

/// Round to one decimal place
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
