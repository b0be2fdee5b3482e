//! Time-of-day distribution
//!
//! Partitions entries into six fixed buckets by the local hour they were
//! logged at and flags late-night activity and morning avoidance.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Concern, ConcernKind, Entry, Severity};

/// Share of late-night entries above which late-night activity is flagged
const LATE_NIGHT_SHARE_THRESHOLD: f64 = 0.3;

/// Entries required before a missing early-morning bucket is flagged
const MORNING_AVOIDANCE_MIN_ENTRIES: usize = 5;

/// Hour-of-day bucket, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// [0, 5)
    LateNight,
    /// [5, 9)
    EarlyMorning,
    /// [9, 12)
    Morning,
    /// [12, 17)
    Afternoon,
    /// [17, 21)
    Evening,
    /// [21, 24)
    Night,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 6] = [
        TimeBucket::LateNight,
        TimeBucket::EarlyMorning,
        TimeBucket::Morning,
        TimeBucket::Afternoon,
        TimeBucket::Evening,
        TimeBucket::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=4 => TimeBucket::LateNight,
            5..=8 => TimeBucket::EarlyMorning,
            9..=11 => TimeBucket::Morning,
            12..=16 => TimeBucket::Afternoon,
            17..=20 => TimeBucket::Evening,
            _ => TimeBucket::Night,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeBucket::LateNight => "Late night (12am-5am)",
            TimeBucket::EarlyMorning => "Early morning (5am-9am)",
            TimeBucket::Morning => "Morning (9am-12pm)",
            TimeBucket::Afternoon => "Afternoon (12pm-5pm)",
            TimeBucket::Evening => "Evening (5pm-9pm)",
            TimeBucket::Night => "Night (9pm-12am)",
        }
    }
}

/// Result of the time-of-day analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDayAnalysis {
    /// Entries per bucket (every bucket present, possibly empty)
    pub distribution: BTreeMap<TimeBucket, Vec<Entry>>,
    /// Bucket with the most entries, `None` when there are no entries
    pub most_active: Option<TimeBucket>,
    /// Total number of entries analyzed
    pub total: usize,
    /// Concerns raised by this analyzer
    pub concerns: Vec<Concern>,
}

impl Default for TimeOfDayAnalysis {
    fn default() -> Self {
        Self {
            distribution: empty_distribution(),
            most_active: None,
            total: 0,
            concerns: Vec::new(),
        }
    }
}

impl TimeOfDayAnalysis {
    pub fn count(&self, bucket: TimeBucket) -> usize {
        self.distribution.get(&bucket).map_or(0, Vec::len)
    }

    /// Entry counts per bucket
    pub fn counts(&self) -> BTreeMap<TimeBucket, usize> {
        TimeBucket::ALL.iter().map(|&b| (b, self.count(b))).collect()
    }
}

fn empty_distribution() -> BTreeMap<TimeBucket, Vec<Entry>> {
    TimeBucket::ALL.iter().map(|&b| (b, Vec::new())).collect()
}

/// Bucket entries by local hour and flag time-of-day concerns
pub fn analyze_time_of_day(entries: &[Entry]) -> TimeOfDayAnalysis {
    let total = entries.len();
    if total == 0 {
        return TimeOfDayAnalysis::default();
    }

    let mut distribution = empty_distribution();
    for entry in entries {
        let bucket = TimeBucket::from_hour(entry.timestamp.hour());
        distribution.entry(bucket).or_default().push(entry.clone());
    }

    // First maximum in declaration order wins ties
    let mut most_active = None;
    let mut best = 0;
    for bucket in TimeBucket::ALL {
        let count = distribution[&bucket].len();
        if most_active.is_none() || count > best {
            most_active = Some(bucket);
            best = count;
        }
    }

    let late_night = distribution[&TimeBucket::LateNight].len();
    let early_morning = distribution[&TimeBucket::EarlyMorning].len();

    let mut concerns = Vec::new();

    if late_night as f64 > total as f64 * LATE_NIGHT_SHARE_THRESHOLD {
        concerns.push(
            Concern::new(
                ConcernKind::LateNightActivity,
                Severity::High,
                "High late-night activity (12am-5am) may indicate sleep disruption or elevated mood",
            )
            .with_count(late_night),
        );
    }

    if early_morning == 0 && total > MORNING_AVOIDANCE_MIN_ENTRIES {
        concerns.push(
            Concern::new(
                ConcernKind::MorningAvoidance,
                Severity::Medium,
                "No morning entries (5am-9am) could suggest difficulty with mornings",
            )
            .with_count(0),
        );
    }

    debug!(
        total,
        late_night,
        early_morning,
        most_active = ?most_active,
        concerns = concerns.len(),
        "time-of-day analysis complete"
    );

    TimeOfDayAnalysis {
        distribution,
        most_active,
        total,
        concerns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{entry_at_hour, entry_at_minutes};
    use chrono::{FixedOffset, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(TimeBucket::from_hour(0), TimeBucket::LateNight);
        assert_eq!(TimeBucket::from_hour(4), TimeBucket::LateNight);
        assert_eq!(TimeBucket::from_hour(5), TimeBucket::EarlyMorning);
        assert_eq!(TimeBucket::from_hour(8), TimeBucket::EarlyMorning);
        assert_eq!(TimeBucket::from_hour(9), TimeBucket::Morning);
        assert_eq!(TimeBucket::from_hour(12), TimeBucket::Afternoon);
        assert_eq!(TimeBucket::from_hour(17), TimeBucket::Evening);
        assert_eq!(TimeBucket::from_hour(20), TimeBucket::Evening);
        assert_eq!(TimeBucket::from_hour(21), TimeBucket::Night);
        assert_eq!(TimeBucket::from_hour(23), TimeBucket::Night);
    }

    #[test]
    fn test_empty_entries() {
        let analysis = analyze_time_of_day(&[]);
        assert_eq!(analysis.total, 0);
        assert!(analysis.most_active.is_none());
        assert!(analysis.concerns.is_empty());
        assert_eq!(analysis.distribution.len(), 6);
    }

    #[test]
    fn test_late_night_activity_fires() {
        // Hours 1, 2, 3 and 23: three of four entries are late-night
        let entries: Vec<Entry> = [1, 2, 3, 23]
            .iter()
            .enumerate()
            .map(|(i, &h)| entry_at_hour(i, h))
            .collect();

        let analysis = analyze_time_of_day(&entries);
        assert_eq!(analysis.count(TimeBucket::LateNight), 3);
        assert_eq!(analysis.count(TimeBucket::Night), 1);
        assert_eq!(analysis.most_active, Some(TimeBucket::LateNight));

        assert_eq!(analysis.concerns.len(), 1);
        let concern = &analysis.concerns[0];
        assert_eq!(concern.kind, ConcernKind::LateNightActivity);
        assert_eq!(concern.severity, Severity::High);
        assert_eq!(concern.count, Some(3));
    }

    #[test]
    fn test_late_night_share_at_threshold_does_not_fire() {
        // 3 of 10 is exactly 30%, not above it
        let hours = [1, 2, 3, 6, 10, 13, 14, 18, 19, 22];
        let entries: Vec<Entry> = hours
            .iter()
            .enumerate()
            .map(|(i, &h)| entry_at_hour(i, h))
            .collect();

        let analysis = analyze_time_of_day(&entries);
        assert!(analysis
            .concerns
            .iter()
            .all(|c| c.kind != ConcernKind::LateNightActivity));
    }

    #[test]
    fn test_morning_avoidance() {
        let hours = [10, 13, 14, 18, 19, 22];
        let entries: Vec<Entry> = hours
            .iter()
            .enumerate()
            .map(|(i, &h)| entry_at_hour(i, h))
            .collect();

        let analysis = analyze_time_of_day(&entries);
        assert_eq!(analysis.concerns.len(), 1);
        assert_eq!(analysis.concerns[0].kind, ConcernKind::MorningAvoidance);
        assert_eq!(analysis.concerns[0].severity, Severity::Medium);

        // Five entries is not enough
        let analysis = analyze_time_of_day(&entries[..5]);
        assert!(analysis.concerns.is_empty());
    }

    #[test]
    fn test_most_active_tie_prefers_declaration_order() {
        // One morning and one afternoon entry: morning is declared first
        let entries = vec![entry_at_hour(0, 14), entry_at_hour(1, 10)];
        let analysis = analyze_time_of_day(&entries);
        assert_eq!(analysis.most_active, Some(TimeBucket::Morning));
    }

    #[test]
    fn test_uses_recorded_offset_hour() {
        // 03:00 UTC logged from UTC-05:00 is 22:00 local
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let mut entry = entry_at_minutes(0, 0);
        entry.timestamp = offset.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();

        let analysis = analyze_time_of_day(&[entry]);
        assert_eq!(analysis.count(TimeBucket::Night), 1);
        assert_eq!(analysis.count(TimeBucket::LateNight), 0);
    }

    proptest! {
        #[test]
        fn prop_bucket_counts_sum_to_total(minutes in prop::collection::vec(0i64..100_000, 0..80)) {
            let entries: Vec<Entry> = minutes
                .iter()
                .enumerate()
                .map(|(i, &m)| entry_at_minutes(i, m))
                .collect();

            let analysis = analyze_time_of_day(&entries);
            let sum: usize = analysis.counts().values().sum();
            prop_assert_eq!(sum, entries.len());
        }
    }
}
