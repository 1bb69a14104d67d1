use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::WebhookConfig;
use crate::report::Notification;
use crate::types::Severity;
use super::{severity_filter, NotificationChannel};

/// Custom webhook notification channel
pub struct WebhookChannel {
    url: String,
    headers: std::collections::HashMap<String, String>,
    severity_filter: Vec<Severity>,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            headers: config.headers.clone(),
            severity_filter: severity_filter(&config.severity_filter),
            client: reqwest::Client::new(),
        })
    }

    fn payload(notification: &Notification) -> Value {
        json!({
            "subject": &notification.subject,
            "severity": notification.severity.to_string(),
            "summary": &notification.summary,
            "html": &notification.html_body,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str { "webhook" }

    fn accepts_severity(&self, severity: &Severity) -> bool {
        self.severity_filter.is_empty() || self.severity_filter.contains(severity)
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let mut req = self.client.post(&self.url).json(&Self::payload(notification));
        for (k, v) in &self.headers {
            req = req.header(k, v);
        }

        req.send().await?.error_for_status()?;
        Ok(())
    }
}
