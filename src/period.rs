//! Period insights
//!
//! Summary of a bounded stretch of history (a week, a month): when entries
//! were logged, how each metric moved across the period, which metrics moved
//! together, and whether tracking was frequent enough to say much.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::correlation::PERIOD_MODERATE_CORRELATION_THRESHOLD;
use crate::analysis::trend::numeric_series;
use crate::analysis::{find_correlations, period_trend, MetricCorrelation, PeriodTrend};
use crate::types::{distinct_days, Entry, Metric, MetricKind};

/// Message returned for a period without entries
pub const NO_DATA_MESSAGE: &str = "No data available for this period";

/// Entries per tracked day below which more frequent tracking is suggested
const ENTRIES_PER_DAY_TARGET: usize = 2;

/// Coarse part of the day used for period patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    /// [5, 12)
    Morning,
    /// [12, 17)
    Afternoon,
    /// [17, 21)
    Evening,
    /// [21, 5)
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Morning,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeSlot::Morning,
            12..=16 => TimeSlot::Afternoon,
            17..=20 => TimeSlot::Evening,
            _ => TimeSlot::Night,
        }
    }
}

/// Entries logged on one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub weekday: Weekday,
    pub count: usize,
}

/// When entries were logged during the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPatterns {
    /// Every slot present, possibly zero
    pub time_of_day: BTreeMap<TimeSlot, usize>,
    /// Seven counts, Sunday first
    pub day_of_week: Vec<WeekdayCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

/// Insights over one period of history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodInsights {
    pub has_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total_entries: usize,
    /// Distinct calendar days with at least one entry
    pub days_tracked: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PeriodPatterns>,
    /// Half-split trends keyed by metric name
    #[serde(default)]
    pub trends: BTreeMap<String, PeriodTrend>,
    #[serde(default)]
    pub correlations: Vec<MetricCorrelation>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl PeriodInsights {
    fn empty() -> Self {
        Self {
            has_data: false,
            message: Some(NO_DATA_MESSAGE.to_string()),
            total_entries: 0,
            days_tracked: 0,
            patterns: None,
            trends: BTreeMap::new(),
            correlations: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

fn period_patterns(entries: &[Entry]) -> PeriodPatterns {
    let mut time_of_day: BTreeMap<TimeSlot, usize> =
        TimeSlot::ALL.iter().map(|&s| (s, 0)).collect();
    let mut weekdays = [0usize; 7];

    for entry in entries {
        *time_of_day
            .entry(TimeSlot::from_hour(entry.timestamp.hour()))
            .or_default() += 1;
        weekdays[entry.timestamp.weekday().num_days_from_sunday() as usize] += 1;
    }

    let mut weekday = Weekday::Sun;
    let mut day_of_week = Vec::with_capacity(7);
    for count in weekdays {
        day_of_week.push(WeekdayCount { weekday, count });
        weekday = weekday.succ();
    }

    PeriodPatterns {
        time_of_day,
        day_of_week,
    }
}

fn period_trends(entries: &[Entry], metrics: &[Metric]) -> BTreeMap<String, PeriodTrend> {
    metrics
        .iter()
        .filter(|m| m.kind() != MetricKind::Text)
        .filter_map(|m| {
            let values: Vec<f64> = numeric_series(entries, &m.id)
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            period_trend(&values).map(|trend| (m.name.clone(), trend))
        })
        .collect()
}

/// Summarize the entries of one period
pub fn period_insights(entries: &[Entry], metrics: &[Metric]) -> PeriodInsights {
    if entries.is_empty() {
        debug!("no entries in period");
        return PeriodInsights::empty();
    }

    let days_tracked = distinct_days(entries);

    let mut recommendations = Vec::new();
    if entries.len() < days_tracked * ENTRIES_PER_DAY_TARGET {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Consistency,
            message: "Try to track multiple times per day for more detailed insights."
                .to_string(),
        });
    }

    let insights = PeriodInsights {
        has_data: true,
        message: None,
        total_entries: entries.len(),
        days_tracked,
        patterns: Some(period_patterns(entries)),
        trends: period_trends(entries, metrics),
        correlations: find_correlations(entries, metrics, PERIOD_MODERATE_CORRELATION_THRESHOLD),
        recommendations,
    };

    debug!(
        entries = insights.total_entries,
        days = insights.days_tracked,
        trends = insights.trends.len(),
        correlations = insights.correlations.len(),
        "period insights complete"
    );

    insights
}
