use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::EmailConfig;
use crate::report::Notification;
use crate::types::Severity;
use super::{severity_filter, NotificationChannel};

/// Email delivery through an HTTP email API (Resend-compatible `POST /emails`)
pub struct EmailChannel {
    api_url: String,
    api_key: String,
    from: String,
    to: Vec<String>,
    severity_filter: Vec<Severity>,
    client: reqwest::Client,
}

impl EmailChannel {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!("alerting.email.api_key is empty");
        }

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            to: config.to.clone(),
            severity_filter: severity_filter(&config.severity_filter),
            client: reqwest::Client::new(),
        })
    }

    fn payload(&self, notification: &Notification) -> Value {
        json!({
            "from": &self.from,
            "to": &self.to,
            "subject": &notification.subject,
            "html": &notification.html_body,
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str { "email" }

    fn accepts_severity(&self, severity: &Severity) -> bool {
        self.severity_filter.is_empty() || self.severity_filter.contains(severity)
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(notification))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
