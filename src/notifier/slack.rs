use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SlackConfig;
use crate::report::Notification;
use crate::types::Severity;
use super::{severity_filter, NotificationChannel};

/// Slack webhook notification channel. Slack cannot render the HTML body, so
/// the plain summary is posted instead.
pub struct SlackChannel {
    webhook_url: String,
    channel: Option<String>,
    severity_filter: Vec<Severity>,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        Ok(Self {
            webhook_url: config.webhook_url.clone(),
            channel: config.channel.clone(),
            severity_filter: severity_filter(&config.severity_filter),
            client: reqwest::Client::new(),
        })
    }

    fn severity_color(severity: &Severity) -> &'static str {
        match severity {
            Severity::Info => "#2ecc71",
            Severity::Warn => "#f39c12",
            Severity::Critical => "#e74c3c",
        }
    }

    fn payload(&self, notification: &Notification) -> Value {
        let mut payload = json!({
            "attachments": [{
                "color": Self::severity_color(&notification.severity),
                "title": format!("[{}] {}", notification.severity, notification.subject),
                "text": &notification.summary,
                "ts": chrono::Utc::now().timestamp(),
            }]
        });

        if let Some(ref ch) = self.channel {
            payload["channel"] = json!(ch);
        }
        payload
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str { "slack" }

    fn accepts_severity(&self, severity: &Severity) -> bool {
        self.severity_filter.is_empty() || self.severity_filter.contains(severity)
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        self.client.post(&self.webhook_url)
            .json(&self.payload(notification))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
