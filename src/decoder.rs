use serde::{Deserialize, Serialize};

use crate::error::WatchError;
use crate::types::ChannelRow;

/// Body of a `runReport` response. Only the rows are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// One provider row: `[channel, date]` dimensions and `[sessions, users]` metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<DimensionValue>,
    #[serde(default)]
    pub metric_values: Vec<MetricValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(default)]
    pub value: String,
}

impl ReportRow {
    pub fn new(channel: &str, date: &str, sessions: &str, users: &str) -> Self {
        Self {
            dimension_values: vec![
                DimensionValue { value: channel.to_string() },
                DimensionValue { value: date.to_string() },
            ],
            metric_values: vec![
                MetricValue { value: sessions.to_string() },
                MetricValue { value: users.to_string() },
            ],
        }
    }

    fn dimension(&self, idx: usize) -> &str {
        self.dimension_values.get(idx).map(|d| d.value.as_str()).unwrap_or("")
    }

    fn metric(&self, idx: usize) -> &str {
        self.metric_values.get(idx).map(|m| m.value.as_str()).unwrap_or("")
    }
}

/// Decode provider rows into typed records.
///
/// Fails the whole pass on the first metric that is not an integer.
pub fn decode_rows(rows: &[ReportRow]) -> Result<Vec<ChannelRow>, WatchError> {
    rows.iter().map(decode_row).collect()
}

pub fn decode_row(row: &ReportRow) -> Result<ChannelRow, WatchError> {
    Ok(ChannelRow {
        channel: row.dimension(0).to_string(),
        date: format_date(row.dimension(1)),
        sessions: parse_metric("sessions", row.metric(0))?,
        users: parse_metric("users", row.metric(1))?,
    })
}

/// `YYYYMMDD` -> `YYYY-MM-DD` by fixed character offsets. No calendar
/// validation: short or malformed input yields a malformed date rather than
/// an error. Offsets count chars, so non-ASCII input is never split mid-char.
pub fn format_date(raw: &str) -> String {
    format!(
        "{}-{}-{}",
        slice_clamped(raw, 0, 4),
        slice_clamped(raw, 4, 6),
        slice_clamped(raw, 6, 8)
    )
}

fn slice_clamped(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn parse_metric(field: &'static str, value: &str) -> Result<u64, WatchError> {
    value.trim().parse::<u64>().map_err(|_| WatchError::MalformedMetric {
        field,
        value: value.to_string(),
    })
}
