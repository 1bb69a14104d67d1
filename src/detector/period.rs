use crate::aggregator::round2;
use crate::config::DetectorConfig;
use crate::types::{Alert, DateRange, UnassignedDay};
use super::Rule;

/// Compares the mean unassigned share of the later half of the window with the
/// earlier half. With an odd number of days the extra day joins the later half.
pub struct PeriodIncreaseRule {
    threshold_pct: f64,
}

impl PeriodIncreaseRule {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold_pct: config.increase_threshold_pct,
        }
    }

    fn mean(days: &[UnassignedDay]) -> f64 {
        days.iter().map(|d| d.percentage).sum::<f64>() / days.len() as f64
    }
}

impl Rule for PeriodIncreaseRule {
    fn name(&self) -> &str { "period_increase" }

    fn evaluate(&self, days: &[UnassignedDay]) -> Option<Alert> {
        if days.len() < 2 {
            return None;
        }

        let (previous, current) = days.split_at(days.len() / 2);
        let previous_avg = Self::mean(previous);
        let current_avg = Self::mean(current);

        // No baseline share, so no relative increase to speak of.
        if previous_avg <= 0.0 {
            return None;
        }

        let increase_pct = (current_avg - previous_avg) / previous_avg * 100.0;
        if !increase_pct.is_finite() || increase_pct < self.threshold_pct {
            return None;
        }

        Some(Alert::SignificantIncrease {
            previous_avg: round2(previous_avg),
            current_avg: round2(current_avg),
            increase_pct: round2(increase_pct),
            previous: DateRange::spanning(previous)?,
            current: DateRange::spanning(current)?,
        })
    }
}
