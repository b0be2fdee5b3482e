//! Entry store and metric registry
//!
//! The engine only needs read access to entries and metrics. These traits are
//! the seam to whatever persistence the host application uses. The in-memory
//! implementations serialize to JSON so a host can persist them as opaque
//! blobs.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{InsightConfig, DEFAULT_MAX_STORED_ENTRIES};
use crate::error::InsightError;
use crate::types::{distinct_days, Entry, Metric, MetricId, MetricKind, MetricShape, Value};

/// Source of logged entries
pub trait EntryStore {
    /// Append a new entry
    fn append(&mut self, entry: Entry);

    /// All entries in insertion order
    fn list_entries(&self) -> Vec<Entry>;

    /// Entries with `start <= timestamp <= end`, in insertion order
    fn list_entries_in_range(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Vec<Entry> {
        self.list_entries()
            .into_iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect()
    }

    /// Remove every entry
    fn clear(&mut self);
}

/// Source of metric definitions
pub trait MetricRegistry {
    /// All metrics in definition order
    fn list_metrics(&self) -> Vec<Metric>;

    /// Look up a metric by id
    fn metric(&self, id: &MetricId) -> Option<Metric> {
        self.list_metrics().into_iter().find(|m| &m.id == id)
    }
}

/// Bounded in-memory entry store.
///
/// Keeps at most `capacity` entries; appending beyond that evicts the oldest
/// inserted entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntryStore {
    entries: VecDeque<Entry>,
    capacity: usize,
}

impl Default for MemoryEntryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_STORED_ENTRIES)
    }
}

impl MemoryEntryStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &InsightConfig) -> Self {
        Self::with_capacity(config.max_stored_entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Validate values against the registry and append a new entry.
    ///
    /// Every value must belong to a registered metric and satisfy its bounds
    /// or option set.
    pub fn log_entry(
        &mut self,
        registry: &impl MetricRegistry,
        timestamp: DateTime<FixedOffset>,
        values: BTreeMap<MetricId, Value>,
    ) -> Result<Entry, InsightError> {
        for (metric_id, value) in &values {
            let metric = registry
                .metric(metric_id)
                .ok_or_else(|| InsightError::UnknownMetric(metric_id.to_string()))?;
            if let Err(e) = metric.validate_value(value) {
                warn!(metric = %metric_id, error = %e, "rejected logged value");
                return Err(e);
            }
        }

        let entry = Entry::new(timestamp, values);
        self.append(entry.clone());
        Ok(entry)
    }

    /// Replace the whole history, keeping the newest `capacity` entries
    pub fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries = entries.into();
        self.evict_overflow();
    }

    /// Take every entry out of the store, leaving it empty
    pub fn take_all(&mut self) -> Vec<Entry> {
        self.entries.drain(..).collect()
    }

    /// Number of distinct calendar days with at least one entry
    pub fn days_tracked(&self) -> usize {
        distinct_days(&self.entries)
    }

    fn evict_overflow(&mut self) {
        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            warn!(
                evicted = overflow,
                capacity = self.capacity,
                "entry store full, evicting oldest entries"
            );
            self.entries.drain(..overflow);
        }
    }

    /// Load a store from JSON
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let mut store: Self = serde_json::from_str(json)?;
        store.capacity = store.capacity.max(1);
        store.evict_overflow();
        Ok(store)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, InsightError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl EntryStore for MemoryEntryStore {
    fn append(&mut self, entry: Entry) {
        debug!(entry_id = %entry.id, "appending entry");
        self.entries.push_back(entry);
        self.evict_overflow();
    }

    fn list_entries(&self) -> Vec<Entry> {
        self.entries.iter().cloned().collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// In-memory metric registry enforcing case-insensitive name uniqueness
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryMetricRegistry {
    metrics: Vec<Metric>,
}

impl MemoryMetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the starter metrics a new tracker ships with
    pub fn with_defaults() -> Self {
        let metrics = vec![
            Metric::new("mood", "Mood", MetricKind::Scale),
            Metric::new("irritability", "Irritability", MetricKind::Scale),
            Metric::new("sleep", "Hours of Sleep", MetricKind::Number).with_shape(
                MetricShape::Number {
                    min: 0.0,
                    max: 24.0,
                    step: 0.5,
                    unit: "h".to_string(),
                },
            ),
            Metric::new("energy", "Energy Level", MetricKind::Emoji).with_shape(
                MetricShape::Emoji {
                    options: ["😴", "😑", "🙂", "😊", "⚡"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
            ),
            Metric::new("social", "Social Interaction", MetricKind::Boolean).with_shape(
                MetricShape::Boolean {
                    label: Some("Had social interaction today".to_string()),
                },
            ),
        ];
        Self { metrics }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Whether a metric with this name exists, ignoring case
    pub fn exists(&self, name: &str) -> bool {
        self.by_name(name).is_some()
    }

    /// Find a metric by name, ignoring case
    pub fn by_name(&self, name: &str) -> Option<&Metric> {
        let wanted = name.trim().to_lowercase();
        self.metrics.iter().find(|m| m.name.to_lowercase() == wanted)
    }

    /// Create a metric with a generated id and the default shape for `kind`
    pub fn add(&mut self, name: &str, kind: MetricKind) -> Result<Metric, InsightError> {
        let metric = Metric::new(MetricId::generate(), name.trim(), kind);
        self.insert(metric.clone())?;
        Ok(metric)
    }

    /// Insert a fully specified metric
    pub fn insert(&mut self, metric: Metric) -> Result<(), InsightError> {
        if metric.name.trim().is_empty() {
            return Err(InsightError::InvalidValue {
                metric: metric.id.to_string(),
                reason: "metric name must not be empty".to_string(),
            });
        }
        if self.exists(&metric.name) || self.metrics.iter().any(|m| m.id == metric.id) {
            return Err(InsightError::DuplicateMetric(metric.name));
        }
        debug!(metric = %metric.id, name = %metric.name, "registering metric");
        self.metrics.push(metric);
        Ok(())
    }

    /// Remove a metric by id, returning it if it existed
    pub fn remove(&mut self, id: &MetricId) -> Option<Metric> {
        let index = self.metrics.iter().position(|m| &m.id == id)?;
        Some(self.metrics.remove(index))
    }

    /// Load a registry from a JSON array of metrics
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let metrics: Vec<Metric> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for metric in metrics {
            registry.insert(metric)?;
        }
        Ok(registry)
    }

    /// Serialize the registry to a JSON array of metrics
    pub fn to_json(&self) -> Result<String, InsightError> {
        Ok(serde_json::to_string(&self.metrics)?)
    }
}

impl MetricRegistry for MemoryMetricRegistry {
    fn list_metrics(&self) -> Vec<Metric> {
        self.metrics.clone()
    }

    fn metric(&self, id: &MetricId) -> Option<Metric> {
        self.metrics.iter().find(|m| &m.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, 0, 0)
            .unwrap()
    }

    fn empty_entry(day: u32, hour: u32) -> Entry {
        Entry::new(ts(day, hour), BTreeMap::new())
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut store = MemoryEntryStore::default();
        store.append(empty_entry(3, 10));
        store.append(empty_entry(1, 10));

        let listed = store.list_entries();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].timestamp, ts(3, 10));
        assert_eq!(listed[1].timestamp, ts(1, 10));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = MemoryEntryStore::with_capacity(3);
        for hour in 0..5 {
            store.append(empty_entry(1, hour));
        }

        assert_eq!(store.len(), 3);
        let hours: Vec<DateTime<FixedOffset>> =
            store.list_entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(hours, vec![ts(1, 2), ts(1, 3), ts(1, 4)]);
    }

    #[test]
    fn test_list_entries_in_range_is_inclusive() {
        let mut store = MemoryEntryStore::default();
        for day in 1..=5 {
            store.append(empty_entry(day, 12));
        }

        let in_range = store.list_entries_in_range(ts(2, 12), ts(4, 12));
        assert_eq!(in_range.len(), 3);

        let in_range = store.list_entries_in_range(ts(2, 13), ts(4, 11));
        assert_eq!(in_range.len(), 1);
    }

    #[test]
    fn test_days_tracked() {
        let mut store = MemoryEntryStore::default();
        store.append(empty_entry(1, 8));
        store.append(empty_entry(1, 20));
        store.append(empty_entry(2, 8));
        assert_eq!(store.days_tracked(), 2);
    }

    #[test]
    fn test_clear_and_take_all() {
        let mut store = MemoryEntryStore::default();
        store.append(empty_entry(1, 8));
        store.append(empty_entry(2, 8));

        let exported = store.take_all();
        assert_eq!(exported.len(), 2);
        assert!(store.is_empty());

        store.replace_all(exported);
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_log_entry_validates_values() {
        let registry = MemoryMetricRegistry::with_defaults();
        let mut store = MemoryEntryStore::default();

        let mut values = BTreeMap::new();
        values.insert(MetricId::from("mood"), Value::Number(7.0));
        values.insert(MetricId::from("social"), Value::Boolean(true));
        assert!(store.log_entry(&registry, ts(1, 9), values).is_ok());

        let mut bad = BTreeMap::new();
        bad.insert(MetricId::from("mood"), Value::Number(42.0));
        assert!(matches!(
            store.log_entry(&registry, ts(1, 10), bad),
            Err(InsightError::InvalidValue { .. })
        ));

        let mut unknown = BTreeMap::new();
        unknown.insert(MetricId::from("ghost"), Value::Number(1.0));
        assert!(matches!(
            store.log_entry(&registry, ts(1, 11), unknown),
            Err(InsightError::UnknownMetric(_))
        ));

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_json_persistence() {
        let mut store = MemoryEntryStore::with_capacity(10);
        let entry = empty_entry(1, 8).with_value("mood", Value::Number(4.0));
        store.append(entry.clone());

        let json = store.to_json().unwrap();
        let loaded = MemoryEntryStore::from_json(&json).unwrap();
        assert_eq!(loaded.capacity(), 10);
        assert_eq!(loaded.list_entries(), vec![entry]);
    }

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let mut registry = MemoryMetricRegistry::with_defaults();
        assert_eq!(registry.len(), 5);

        let result = registry.add("  mood ", MetricKind::Scale);
        assert!(matches!(result, Err(InsightError::DuplicateMetric(_))));

        let added = registry.add("Anxiety", MetricKind::Scale).unwrap();
        assert!(added.id.as_str().starts_with("metric_"));
        assert!(registry.exists("ANXIETY"));
        assert_eq!(registry.metric(&added.id), Some(added.clone()));

        assert!(registry.add("", MetricKind::Text).is_err());
    }

    #[test]
    fn test_registry_remove_and_json() {
        let mut registry = MemoryMetricRegistry::with_defaults();
        let removed = registry.remove(&MetricId::from("energy")).unwrap();
        assert_eq!(removed.name, "Energy Level");
        assert!(registry.remove(&MetricId::from("energy")).is_none());

        let json = registry.to_json().unwrap();
        let loaded = MemoryMetricRegistry::from_json(&json).unwrap();
        assert_eq!(loaded.list_metrics(), registry.list_metrics());
    }

    #[test]
    fn test_trait_default_range_query() {
        struct VecStore(Vec<Entry>);
        impl EntryStore for VecStore {
            fn append(&mut self, entry: Entry) {
                self.0.push(entry);
            }
            fn list_entries(&self) -> Vec<Entry> {
                self.0.clone()
            }
            fn clear(&mut self) {
                self.0.clear();
            }
        }

        let start = ts(1, 0);
        let mut store = VecStore(Vec::new());
        for h in 0..4 {
            store.append(Entry::new(start + Duration::hours(h * 10), BTreeMap::new()));
        }
        assert_eq!(
            store
                .list_entries_in_range(start, start + Duration::hours(15))
                .len(),
            2
        );
    }
}
