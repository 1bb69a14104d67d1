use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregator::{self, round2, ChannelBreakdown};
use crate::config::{DetectorConfig, OrganicConfig};
use crate::decoder::{self, ReportRow};
use crate::detector::Detector;
use crate::error::WatchError;
use crate::types::{Alert, ChannelTotal, DailyTotal, UnassignedDay};

/// Channels whose share is listed in the unassigned report
pub const REPORTED_CHANNELS: [&str; 3] = ["Organic Search", "Direct", "Referral"];

/// Everything derived from one window: the aggregated views and the alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelAnalysis {
    pub by_date: BTreeMap<String, DailyTotal>,
    pub by_channel: BTreeMap<String, ChannelTotal>,
    pub unassigned_days: Vec<UnassignedDay>,
    pub alerts: Vec<Alert>,
}

impl ChannelAnalysis {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn total_sessions(&self) -> u64 {
        self.by_channel.values().map(|c| c.total).sum()
    }

    /// Percent change in total sessions between the two halves of the window,
    /// split at the same midpoint the period rule uses.
    pub fn session_trend(&self) -> Option<f64> {
        let totals: Vec<u64> = self.by_date.values().map(|d| d.total).collect();
        if totals.len() < 2 {
            return None;
        }
        let (previous, recent) = totals.split_at(totals.len() / 2);
        let previous: u64 = previous.iter().sum();
        let recent: u64 = recent.iter().sum();
        if previous == 0 {
            return None;
        }
        Some(round2((recent as f64 - previous as f64) / previous as f64 * 100.0))
    }

    /// Shares of the channels shown in reports, skipping channels absent from the window.
    pub fn report_shares(&self) -> Vec<(String, f64)> {
        REPORTED_CHANNELS
            .iter()
            .filter(|c| self.by_channel.contains_key(**c))
            .map(|c| (c.to_string(), self.channel_share(c)))
            .collect()
    }

    /// A channel's share of all sessions in the window, in percent.
    pub fn channel_share(&self, channel: &str) -> f64 {
        let total = self.total_sessions();
        match self.by_channel.get(channel) {
            Some(c) if total > 0 => round2(c.total as f64 / total as f64 * 100.0),
            _ => 0.0,
        }
    }
}

/// Decode, aggregate and run every detection rule over one window of rows.
pub fn analyze(rows: &[ReportRow], config: &DetectorConfig) -> Result<ChannelAnalysis, WatchError> {
    let decoded = decoder::decode_rows(rows)?;
    let ChannelBreakdown {
        by_date,
        by_channel,
        unassigned_days,
    } = aggregator::aggregate(&decoded, &config.unassigned_label);

    let alerts = Detector::new(config).detect(&unassigned_days);

    Ok(ChannelAnalysis {
        by_date,
        by_channel,
        unassigned_days,
        alerts,
    })
}

/// Totals behind the daily organic-traffic check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganicSummary {
    pub total_sessions: u64,
    pub organic_sessions: u64,
    pub has_organic: bool,
}

/// Sum sessions per channel and flag a window with effectively no organic traffic.
///
/// The organic label is matched exactly, case included.
pub fn check_organic(rows: &[ReportRow], config: &OrganicConfig) -> Result<OrganicSummary, WatchError> {
    let decoded = decoder::decode_rows(rows)?;
    let breakdown = aggregator::aggregate(&decoded, "");

    let total_sessions = breakdown.by_channel.values().map(|c| c.total).sum();
    let organic_sessions = breakdown
        .by_channel
        .get(&config.channel_label)
        .map(|c| c.total)
        .unwrap_or(0);

    Ok(OrganicSummary {
        total_sessions,
        organic_sessions,
        has_organic: organic_sessions > config.min_sessions,
    })
}
