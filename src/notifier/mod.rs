pub mod email;
pub mod slack;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::AlertingConfig;
use crate::report::Notification;
use crate::types::Severity;

/// Trait for notification delivery channels
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name
    fn name(&self) -> &str;

    /// Send a single notification
    async fn send(&self, notification: &Notification) -> Result<()>;

    /// Check if this channel accepts the given severity
    fn accepts_severity(&self, severity: &Severity) -> bool;
}

/// Parse configured severity names. Unknown names are ignored.
pub(crate) fn severity_filter(names: &[String]) -> Vec<Severity> {
    names.iter()
        .filter_map(|s| match s.as_str() {
            "info" => Some(Severity::Info),
            "warn" => Some(Severity::Warn),
            "critical" => Some(Severity::Critical),
            _ => None,
        })
        .collect()
}

/// Result of one delivery attempt across all channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
}

impl DeliveryReport {
    pub fn sent(&self) -> bool {
        self.delivered > 0
    }
}

/// Fans a notification out to every configured channel.
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn new(config: &AlertingConfig) -> Result<Self> {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if let Some(ref ec) = config.email {
            if ec.enabled && ec.api_key.trim().is_empty() {
                tracing::warn!("Email channel enabled without an API key, skipping it");
            } else if ec.enabled {
                channels.push(Box::new(email::EmailChannel::new(ec)?));
            }
        }

        if let Some(ref wc) = config.webhook {
            if wc.enabled {
                channels.push(Box::new(webhook::WebhookChannel::new(wc)?));
            }
        }

        if let Some(ref sc) = config.slack {
            if sc.enabled {
                channels.push(Box::new(slack::SlackChannel::new(sc)?));
            }
        }

        tracing::info!(channels = channels.len(), "Initialized notification channels");

        Ok(Self::with_channels(channels))
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn is_configured(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Best effort: a failing channel is logged and skipped.
    pub async fn deliver(&self, notification: &Notification) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for channel in &self.channels {
            if !channel.accepts_severity(&notification.severity) {
                tracing::debug!(channel = channel.name(), severity = %notification.severity, "Channel skipped by severity filter");
                continue;
            }
            report.attempted += 1;
            match channel.send(notification).await {
                Ok(()) => {
                    report.delivered += 1;
                    tracing::info!(channel = channel.name(), subject = %notification.subject, "Notification sent");
                }
                Err(e) => {
                    tracing::error!(
                        channel = channel.name(),
                        error = %e,
                        "Failed to send notification"
                    );
                }
            }
        }

        report
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// In-process channel that counts sends and can be told to fail.
    pub struct RecordingChannel {
        pub sent: Arc<AtomicUsize>,
        pub fail: bool,
        pub only: Vec<Severity>,
    }

    impl RecordingChannel {
        pub fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
            let sent = Arc::new(AtomicUsize::new(0));
            (Self { sent: sent.clone(), fail, only: vec![] }, sent)
        }
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        fn name(&self) -> &str { "recording" }

        fn accepts_severity(&self, severity: &Severity) -> bool {
            self.only.is_empty() || self.only.contains(severity)
        }

        async fn send(&self, _notification: &Notification) -> Result<()> {
            if self.fail {
                anyhow::bail!("simulated delivery failure");
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
