use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::decoder::ReportRow;
use crate::error::WatchError;
use super::ChannelSource;

/// Shape of the traffic produced in test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Healthy traffic with a small, flat unassigned share
    Normal,
    /// Organic search present but with zero sessions
    NoOrganic,
    /// Unassigned share jumps in the second half of the window and keeps rising
    UnassignedSpike,
}

/// Generates plausible channel rows without calling the provider.
pub struct SimulatedSource {
    scenario: Scenario,
    today: NaiveDate,
    seed: Option<u64>,
}

impl SimulatedSource {
    pub fn new(scenario: Scenario, today: NaiveDate) -> Self {
        Self { scenario, today, seed: None }
    }

    /// Fixed seed for reproducible data.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn generate(&self, start_offset_days: u32, end_offset_days: u32) -> Vec<ReportRow> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (first, last) = if start_offset_days >= end_offset_days {
            (start_offset_days, end_offset_days)
        } else {
            (end_offset_days, start_offset_days)
        };
        let span = (first - last + 1) as usize;

        let mut rows = Vec::with_capacity(span * 4);
        for (idx, offset) in (last..=first).rev().enumerate() {
            let date = self.today - Duration::days(offset as i64);
            let date = date.format("%Y%m%d").to_string();

            let organic = match self.scenario {
                Scenario::NoOrganic => 0,
                _ => rng.gen_range(300..500u64),
            };
            let direct = rng.gen_range(150..300u64);
            let referral = rng.gen_range(40..120u64);
            let attributed = organic + direct + referral;

            let share = match self.scenario {
                Scenario::UnassignedSpike if idx >= span / 2 => {
                    let step = (idx - span / 2) as f64;
                    0.10 + 0.02 * step + rng.gen_range(0.0..0.005)
                }
                _ => rng.gen_range(0.01..0.02),
            };
            let unassigned = (attributed as f64 * share).round() as u64;

            for (channel, sessions) in [
                ("Organic Search", organic),
                ("Direct", direct),
                ("Referral", referral),
                ("Unassigned", unassigned),
            ] {
                let users = sessions * 4 / 5;
                rows.push(ReportRow::new(channel, &date, &sessions.to_string(), &users.to_string()));
            }
        }
        rows
    }
}

#[async_trait]
impl ChannelSource for SimulatedSource {
    fn name(&self) -> &str { "simulated" }

    async fn fetch_channel_window(
        &self,
        start_offset_days: u32,
        end_offset_days: u32,
    ) -> Result<Vec<ReportRow>, WatchError> {
        let rows = self.generate(start_offset_days, end_offset_days);
        tracing::info!(rows = rows.len(), scenario = ?self.scenario, "Generated simulated report");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectorConfig, OrganicConfig};
    use crate::pipeline;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn covers_each_day_of_window() {
        let source = SimulatedSource::new(Scenario::Normal, today()).with_seed(7);
        let rows = source.fetch_channel_window(14, 1).await.unwrap();
        assert_eq!(rows.len(), 14 * 4);
        assert_eq!(rows[0].dimension_values[1].value, "20250301");
        assert_eq!(rows[rows.len() - 1].dimension_values[1].value, "20250314");
    }

    #[tokio::test]
    async fn normal_traffic_has_no_high_day() {
        let source = SimulatedSource::new(Scenario::Normal, today()).with_seed(11);
        let rows = source.fetch_channel_window(14, 1).await.unwrap();
        let analysis = pipeline::analyze(&rows, &DetectorConfig::default()).unwrap();
        assert!(analysis
            .alerts
            .iter()
            .all(|a| a.kind() != "HIGH_UNASSIGNED_DAY"));
    }

    #[tokio::test]
    async fn spike_triggers_every_rule() {
        let source = SimulatedSource::new(Scenario::UnassignedSpike, today()).with_seed(3);
        let rows = source.fetch_channel_window(14, 1).await.unwrap();
        let analysis = pipeline::analyze(&rows, &DetectorConfig::default()).unwrap();
        let kinds: Vec<&str> = analysis.alerts.iter().map(|a| a.kind()).collect();
        assert_eq!(
            kinds,
            vec!["SIGNIFICANT_INCREASE", "INCREASING_TREND", "HIGH_UNASSIGNED_DAY"]
        );
    }

    #[tokio::test]
    async fn no_organic_scenario_fails_organic_check() {
        let source = SimulatedSource::new(Scenario::NoOrganic, today()).with_seed(5);
        let rows = source.fetch_channel_window(5, 1).await.unwrap();
        let summary = pipeline::check_organic(&rows, &OrganicConfig::default()).unwrap();
        assert_eq!(summary.organic_sessions, 0);
        assert!(summary.total_sessions > 0);
        assert!(!summary.has_organic);
    }
}
