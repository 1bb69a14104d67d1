use crate::config::DetectorConfig;
use crate::types::{Alert, TrendPoint, UnassignedDay};
use super::Rule;

/// Fires when the share rose strictly on each of the last three days and the
/// third day is clearly above the first.
pub struct TrendRule {
    /// Minimum growth of day three over day one, as a multiplier (1.1 for 10%).
    min_growth: f64,
}

impl TrendRule {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_growth: 1.0 + config.trend_relative_increase_pct / 100.0,
        }
    }
}

impl Rule for TrendRule {
    fn name(&self) -> &str { "trend" }

    fn evaluate(&self, days: &[UnassignedDay]) -> Option<Alert> {
        let tail = days.get(days.len().checked_sub(3)?..)?;
        let [first, second, third] = tail else {
            return None;
        };

        let rising = first.percentage < second.percentage && second.percentage < third.percentage;
        if !rising || third.percentage <= first.percentage * self.min_growth {
            return None;
        }

        let point = |d: &UnassignedDay| TrendPoint {
            date: d.date.clone(),
            percentage: d.percentage,
        };
        Some(Alert::IncreasingTrend {
            days: [point(first), point(second), point(third)],
        })
    }
}
