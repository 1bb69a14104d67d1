pub mod high_day;
pub mod period;
pub mod trend;

use crate::config::DetectorConfig;
use crate::types::{Alert, UnassignedDay};

/// A single detection rule over the unassigned series.
///
/// Rules see the series sorted ascending by date and are independent of each
/// other: each one fires at most one alert per pass.
pub trait Rule: Send + Sync {
    /// Human-readable name for this rule
    fn name(&self) -> &str;

    /// Evaluate the series and return an alert if the rule fires
    fn evaluate(&self, days: &[UnassignedDay]) -> Option<Alert>;
}

/// Create all rules in reporting order: period increase, trend, high day.
pub fn create_rules(config: &DetectorConfig) -> Vec<Box<dyn Rule>> {
    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(period::PeriodIncreaseRule::new(config)),
        Box::new(trend::TrendRule::new(config)),
        Box::new(high_day::HighDayRule::new(config)),
    ];

    tracing::debug!(count = rules.len(), "Initialized detection rules");
    rules
}

/// Runs every rule over one window. Holds no state between passes.
pub struct Detector {
    rules: Vec<Box<dyn Rule>>,
}

impl Detector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self { rules: create_rules(config) }
    }

    pub fn detect(&self, days: &[UnassignedDay]) -> Vec<Alert> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let alert = rule.evaluate(days)?;
                tracing::debug!(rule = rule.name(), kind = alert.kind(), "Rule fired");
                Some(alert)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn series(percentages: &[f64]) -> Vec<UnassignedDay> {
    percentages
        .iter()
        .enumerate()
        .map(|(i, p)| UnassignedDay {
            date: format!("2025-03-{:02}", i + 1),
            sessions: (p * 10.0).round() as u64,
            users: (p * 8.0).round() as u64,
            percentage: *p,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_raises_nothing() {
        let detector = Detector::new(&DetectorConfig::default());
        assert!(detector.detect(&series(&[1.0; 14])).is_empty());
    }

    #[test]
    fn empty_series_raises_nothing() {
        let detector = Detector::new(&DetectorConfig::default());
        assert!(detector.detect(&[]).is_empty());
    }

    #[test]
    fn alerts_follow_rule_order() {
        let mut pcts = vec![2.0; 7];
        pcts.extend([3.0, 4.0, 6.0, 8.0, 9.0, 10.0, 12.0]);
        let detector = Detector::new(&DetectorConfig::default());
        let alerts = detector.detect(&series(&pcts));

        let kinds: Vec<&str> = alerts.iter().map(|a| a.kind()).collect();
        assert_eq!(
            kinds,
            vec!["SIGNIFICANT_INCREASE", "INCREASING_TREND", "HIGH_UNASSIGNED_DAY"]
        );
    }

    #[test]
    fn detection_is_repeatable() {
        let pcts = [1.0, 2.0, 1.5, 6.0, 7.0, 9.5, 3.0, 8.0];
        let detector = Detector::new(&DetectorConfig::default());
        let days = series(&pcts);
        assert_eq!(detector.detect(&days), detector.detect(&days));
    }
}
