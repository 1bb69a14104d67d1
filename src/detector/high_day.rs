use crate::config::DetectorConfig;
use crate::types::{Alert, UnassignedDay};
use super::Rule;

/// Reports the worst recent day whose unassigned share exceeds the threshold.
/// Ties keep the earliest day.
pub struct HighDayRule {
    threshold_pct: f64,
    lookback: usize,
}

impl HighDayRule {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold_pct: config.high_day_threshold_pct,
            lookback: config.high_day_lookback,
        }
    }
}

impl Rule for HighDayRule {
    fn name(&self) -> &str { "high_day" }

    fn evaluate(&self, days: &[UnassignedDay]) -> Option<Alert> {
        let recent = &days[days.len().saturating_sub(self.lookback)..];

        let worst = recent
            .iter()
            .filter(|d| d.percentage > self.threshold_pct)
            .fold(None::<&UnassignedDay>, |best, day| match best {
                Some(b) if b.percentage >= day.percentage => Some(b),
                _ => Some(day),
            })?;

        Some(Alert::HighUnassignedDay {
            date: worst.date.clone(),
            percentage: worst.percentage,
            sessions: worst.sessions,
        })
    }
}
