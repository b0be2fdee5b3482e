//! Concern aggregation

use crate::types::Concern;

/// Merge concern lists into one list ordered by severity.
///
/// Groups are concatenated in the order given and then stable-sorted, so
/// concerns of equal severity keep their group order. The report builder
/// passes time-of-day, rapid-logging, completion and avoidance concerns, in
/// that order.
pub fn aggregate_concerns<I>(groups: I) -> Vec<Concern>
where
    I: IntoIterator<Item = Vec<Concern>>,
{
    let mut all: Vec<Concern> = groups.into_iter().flatten().collect();
    all.sort_by_key(|c| c.severity.rank());
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConcernKind, Severity};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_severity_order_is_stable() {
        let time = vec![
            Concern::new(ConcernKind::LateNightActivity, Severity::High, "late"),
            Concern::new(ConcernKind::MorningAvoidance, Severity::Medium, "morning"),
        ];
        let rapid = vec![Concern::new(ConcernKind::RapidLogging, Severity::Medium, "rapid")];
        let completion = vec![
            Concern::new(ConcernKind::LowCompletion, Severity::Low, "sleep"),
            Concern::new(ConcernKind::LowCompletion, Severity::Low, "energy"),
        ];
        let avoidance = vec![Concern::new(ConcernKind::Avoidance, Severity::High, "gap")];

        let merged = aggregate_concerns([time, rapid, completion, avoidance]);
        let messages: Vec<&str> = merged.iter().map(|c| c.message.as_str()).collect();

        assert_eq!(
            messages,
            vec!["late", "gap", "morning", "rapid", "sleep", "energy"]
        );
    }

    #[test]
    fn test_empty_groups() {
        let merged = aggregate_concerns(Vec::<Vec<Concern>>::new());
        assert!(merged.is_empty());
    }
}
