use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ChannelRow, ChannelTotal, DailyTotal, UnassignedDay};

/// The three views derived from one window of decoded rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelBreakdown {
    pub by_date: BTreeMap<String, DailyTotal>,
    pub by_channel: BTreeMap<String, ChannelTotal>,
    /// Sorted ascending by date.
    pub unassigned_days: Vec<UnassignedDay>,
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Case-insensitive exact match against the unassigned label.
pub fn is_unassigned(channel: &str, label: &str) -> bool {
    channel.to_lowercase() == label.to_lowercase()
}

/// Build per-date totals, per-channel totals and the unassigned series.
///
/// Rows repeating a (channel, date) pair are summed, so every
/// `DailyTotal::total` stays equal to the sum of its channels.
pub fn aggregate(rows: &[ChannelRow], unassigned_label: &str) -> ChannelBreakdown {
    let mut by_date: BTreeMap<String, DailyTotal> = BTreeMap::new();
    let mut by_channel: BTreeMap<String, ChannelTotal> = BTreeMap::new();
    let mut unassigned_days = Vec::new();

    for row in rows {
        let day = by_date.entry(row.date.clone()).or_default();
        day.total += row.sessions;
        *day.channels.entry(row.channel.clone()).or_insert(0) += row.sessions;

        let channel = by_channel.entry(row.channel.clone()).or_default();
        channel.total += row.sessions;
        *channel.dates.entry(row.date.clone()).or_insert(0) += row.sessions;

        if is_unassigned(&row.channel, unassigned_label) {
            unassigned_days.push(UnassignedDay {
                date: row.date.clone(),
                sessions: row.sessions,
                users: row.users,
                percentage: 0.0,
            });
        }
    }

    for day in unassigned_days.iter_mut() {
        day.percentage = match by_date.get(&day.date) {
            Some(total) if total.total > 0 => {
                round2(day.sessions as f64 / total.total as f64 * 100.0)
            }
            _ => 0.0,
        };
    }

    // Stable, lexicographic: valid only for zero-padded ISO dates.
    unassigned_days.sort_by(|a, b| a.date.cmp(&b.date));

    tracing::trace!(
        dates = by_date.len(),
        channels = by_channel.len(),
        unassigned = unassigned_days.len(),
        "Aggregated channel window"
    );

    ChannelBreakdown {
        by_date,
        by_channel,
        unassigned_days,
    }
}
