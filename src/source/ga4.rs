use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SourceConfig;
use crate::decoder::{ReportRow, RunReportResponse};
use crate::error::WatchError;
use super::{ChannelSource, TokenSource};

/// Google Analytics 4 Data API client (`properties/{id}:runReport`)
pub struct Ga4Source {
    report_url: String,
    channel_dimension: String,
    tokens: Box<dyn TokenSource>,
    client: reqwest::Client,
}

impl Ga4Source {
    pub fn new(config: &SourceConfig, tokens: Box<dyn TokenSource>) -> Result<Self, WatchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            report_url: format!(
                "{}/properties/{}:runReport",
                config.endpoint.trim_end_matches('/'),
                config.property_id
            ),
            channel_dimension: config.channel_dimension.clone(),
            tokens,
            client,
        })
    }

    /// GA4 relative date for an offset in days.
    fn relative_date(offset_days: u32) -> String {
        match offset_days {
            0 => "today".to_string(),
            1 => "yesterday".to_string(),
            n => format!("{}daysAgo", n),
        }
    }

    /// Report request: `[channel, date]` dimensions and `[sessions, activeUsers]`
    /// metrics, ordered by date.
    pub fn request_body(&self, start_offset_days: u32, end_offset_days: u32) -> Value {
        json!({
            "dateRanges": [{
                "startDate": Self::relative_date(start_offset_days),
                "endDate": Self::relative_date(end_offset_days),
            }],
            "dimensions": [
                { "name": &self.channel_dimension },
                { "name": "date" },
            ],
            "metrics": [
                { "name": "sessions" },
                { "name": "activeUsers" },
            ],
            "orderBys": [
                { "dimension": { "dimensionName": "date" } },
            ],
        })
    }
}

#[async_trait]
impl ChannelSource for Ga4Source {
    fn name(&self) -> &str { "ga4" }

    async fn fetch_channel_window(
        &self,
        start_offset_days: u32,
        end_offset_days: u32,
    ) -> Result<Vec<ReportRow>, WatchError> {
        let token = self.tokens.access_token().await?;
        let body = self.request_body(start_offset_days, end_offset_days);

        tracing::debug!(url = %self.report_url, start = start_offset_days, end = end_offset_days, "Requesting report");

        let response = self.client.post(&self.report_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(WatchError::ProviderFetchFailed {
                status: status.as_u16(),
                body: text,
            });
        }

        let report: RunReportResponse = serde_json::from_str(&text)?;
        tracing::info!(rows = report.rows.len(), "Fetched channel report");
        Ok(report.rows)
    }
}
