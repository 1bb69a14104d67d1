use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::error::WatchError;
use crate::notifier::Notifier;
use crate::pipeline::{self, ChannelAnalysis, OrganicSummary};
use crate::report::{self, Notification, ReportContext};
use crate::source::ChannelSource;

/// How a check run was requested
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Data comes from the simulated source
    pub is_test: bool,
    /// Deliver even in test mode
    pub send_in_test: bool,
    /// Override the configured window length
    pub window_days: Option<u32>,
}

impl CheckOptions {
    fn should_deliver(&self) -> bool {
        !self.is_test || self.send_in_test
    }
}

/// Outcome of one check, as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome<T> {
    pub status: String,
    pub is_test: bool,
    pub email_sent: bool,
    pub email_configured: bool,
    pub data: T,
}

fn with_delivery(status: String, sent: bool) -> String {
    if sent {
        format!("{} (sent)", status)
    } else {
        status
    }
}

async fn deliver(notifier: &Notifier, notification: &Notification, opts: &CheckOptions) -> bool {
    if !opts.should_deliver() {
        tracing::debug!("Test run without --send-email, skipping delivery");
        return false;
    }
    if !notifier.is_configured() {
        tracing::warn!("No notification channel configured, nothing sent");
        return false;
    }
    notifier.deliver(notification).await.sent()
}

/// Fetch the unassigned window, run the detector and notify when anything fired.
pub async fn run_unassigned_check(
    source: &dyn ChannelSource,
    notifier: &Notifier,
    config: &Config,
    opts: CheckOptions,
    today: NaiveDate,
) -> Result<CheckOutcome<ChannelAnalysis>, WatchError> {
    let mut window = config.unassigned.clone();
    if let Some(days) = opts.window_days {
        window.window_days = days;
    }

    let rows = source
        .fetch_channel_window(window.start_offset_days(), window.end_offset_days)
        .await?;
    let analysis = pipeline::analyze(&rows, &config.detector)?;

    tracing::info!(
        source = source.name(),
        days = analysis.unassigned_days.len(),
        alerts = analysis.alerts.len(),
        "Unassigned traffic analysed"
    );

    if !analysis.has_alerts() {
        return Ok(CheckOutcome {
            status: "no alert".to_string(),
            is_test: opts.is_test,
            email_sent: false,
            email_configured: notifier.is_configured(),
            data: analysis,
        });
    }

    let ctx = ReportContext {
        date: today,
        window_days: window.window_days,
        is_test: opts.is_test,
        session_trend: analysis.session_trend(),
        channel_shares: analysis.report_shares(),
    };
    let notification = report::unassigned_alert(&analysis.alerts, &ctx);
    let sent = deliver(notifier, &notification, &opts).await;

    Ok(CheckOutcome {
        status: with_delivery(format!("{} alert(s) detected", analysis.alerts.len()), sent),
        is_test: opts.is_test,
        email_sent: sent,
        email_configured: notifier.is_configured(),
        data: analysis,
    })
}

/// Fetch the organic window and send either the daily summary or the
/// no-organic-traffic alert.
pub async fn run_organic_check(
    source: &dyn ChannelSource,
    notifier: &Notifier,
    config: &Config,
    opts: CheckOptions,
    today: NaiveDate,
) -> Result<CheckOutcome<OrganicSummary>, WatchError> {
    let mut window = config.organic.window();
    if let Some(days) = opts.window_days {
        window.window_days = days;
    }

    let rows = source
        .fetch_channel_window(window.start_offset_days(), window.end_offset_days)
        .await?;
    let summary = pipeline::check_organic(&rows, &config.organic)?;

    tracing::info!(
        source = source.name(),
        total = summary.total_sessions,
        organic = summary.organic_sessions,
        "Organic traffic checked"
    );

    let ctx = ReportContext {
        date: today,
        window_days: window.window_days,
        is_test: opts.is_test,
        session_trend: None,
        channel_shares: vec![],
    };
    let notification = report::daily_summary(&summary, &ctx);
    let sent = deliver(notifier, &notification, &opts).await;

    let status = if summary.has_organic { "daily report" } else { "no organic traffic" };

    Ok(CheckOutcome {
        status: with_delivery(status.to_string(), sent),
        is_test: opts.is_test,
        email_sent: sent,
        email_configured: notifier.is_configured(),
        data: summary,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::decoder::ReportRow;
    use crate::notifier::testing::RecordingChannel;

    /// Returns canned rows, or a provider failure, and records the requested window.
    struct FixedSource {
        rows: Vec<ReportRow>,
        fail: bool,
        requested: Mutex<Option<(u32, u32)>>,
    }

    impl FixedSource {
        fn new(rows: Vec<ReportRow>) -> Self {
            Self { rows, fail: false, requested: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl ChannelSource for FixedSource {
        fn name(&self) -> &str { "fixed" }

        async fn fetch_channel_window(&self, start: u32, end: u32) -> Result<Vec<ReportRow>, WatchError> {
            *self.requested.lock().unwrap() = Some((start, end));
            if self.fail {
                return Err(WatchError::ProviderFetchFailed {
                    status: 403,
                    body: "permission denied".into(),
                });
            }
            Ok(self.rows.clone())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn flat_rows(unassigned: u64) -> Vec<ReportRow> {
        (1..=14)
            .flat_map(|d| {
                let date = format!("202503{:02}", d);
                vec![
                    ReportRow::new("Unassigned", &date, &unassigned.to_string(), "1"),
                    ReportRow::new("Direct", &date, &(100 - unassigned).to_string(), "1"),
                ]
            })
            .collect()
    }

    #[tokio::test]
    async fn quiet_window_reports_no_alert() {
        let source = FixedSource::new(flat_rows(1));
        let (channel, sent) = RecordingChannel::new(false);
        let notifier = Notifier::with_channels(vec![Box::new(channel)]);

        let outcome = run_unassigned_check(&source, &notifier, &Config::default(), CheckOptions::default(), today())
            .await
            .unwrap();

        assert_eq!(outcome.status, "no alert");
        assert!(!outcome.email_sent);
        assert!(outcome.email_configured);
        assert_eq!(sent.load(Ordering::SeqCst), 0);
        assert_eq!(*source.requested.lock().unwrap(), Some((14, 1)));
    }

    #[tokio::test]
    async fn alerts_are_delivered() {
        let source = FixedSource::new(flat_rows(8));
        let (channel, sent) = RecordingChannel::new(false);
        let notifier = Notifier::with_channels(vec![Box::new(channel)]);

        let outcome = run_unassigned_check(&source, &notifier, &Config::default(), CheckOptions::default(), today())
            .await
            .unwrap();

        assert_eq!(outcome.status, "1 alert(s) detected (sent)");
        assert!(outcome.email_sent);
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delivery_failure_keeps_detection_result() {
        let source = FixedSource::new(flat_rows(8));
        let (channel, _) = RecordingChannel::new(true);
        let notifier = Notifier::with_channels(vec![Box::new(channel)]);

        let outcome = run_unassigned_check(&source, &notifier, &Config::default(), CheckOptions::default(), today())
            .await
            .unwrap();

        assert_eq!(outcome.status, "1 alert(s) detected");
        assert!(!outcome.email_sent);
        assert_eq!(outcome.data.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_mode_does_not_deliver_unless_asked() {
        let source = FixedSource::new(flat_rows(8));
        let (channel, sent) = RecordingChannel::new(false);
        let notifier = Notifier::with_channels(vec![Box::new(channel)]);
        let opts = CheckOptions { is_test: true, ..CheckOptions::default() };

        let outcome = run_unassigned_check(&source, &notifier, &Config::default(), opts, today())
            .await
            .unwrap();
        assert!(outcome.is_test);
        assert!(!outcome.email_sent);
        assert_eq!(sent.load(Ordering::SeqCst), 0);

        let opts = CheckOptions { is_test: true, send_in_test: true, window_days: None };
        let outcome = run_unassigned_check(&source, &notifier, &Config::default(), opts, today())
            .await
            .unwrap();
        assert!(outcome.email_sent);
    }

    #[tokio::test]
    async fn email_without_api_key_still_runs_the_check() {
        let mut config = Config::default();
        config.alerting.email = Some(crate::config::EmailConfig {
            enabled: true,
            api_url: "https://api.resend.com/emails".into(),
            api_key: String::new(),
            from: "alerts@example.com".into(),
            to: vec!["ops@example.com".into()],
            severity_filter: vec![],
        });
        let notifier = Notifier::new(&config.alerting).unwrap();
        let source = FixedSource::new(flat_rows(8));

        let outcome = run_unassigned_check(&source, &notifier, &config, CheckOptions::default(), today())
            .await
            .unwrap();

        assert_eq!(outcome.status, "1 alert(s) detected");
        assert!(!outcome.email_configured);
        assert!(!outcome.email_sent);
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let mut source = FixedSource::new(vec![]);
        source.fail = true;
        let notifier = Notifier::with_channels(vec![]);

        let err = run_unassigned_check(&source, &notifier, &Config::default(), CheckOptions::default(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::ProviderFetchFailed { status: 403, .. }));
    }

    #[tokio::test]
    async fn window_override_changes_request() {
        let source = FixedSource::new(vec![]);
        let notifier = Notifier::with_channels(vec![]);
        let opts = CheckOptions { window_days: Some(30), ..CheckOptions::default() };

        run_unassigned_check(&source, &notifier, &Config::default(), opts, today())
            .await
            .unwrap();
        assert_eq!(*source.requested.lock().unwrap(), Some((30, 1)));
    }

    #[tokio::test]
    async fn organic_check_sends_daily_report() {
        let source = FixedSource::new(vec![
            ReportRow::new("Organic Search", "20250314", "400", "300"),
            ReportRow::new("Direct", "20250314", "200", "150"),
        ]);
        let (channel, sent) = RecordingChannel::new(false);
        let notifier = Notifier::with_channels(vec![Box::new(channel)]);

        let outcome = run_organic_check(&source, &notifier, &Config::default(), CheckOptions::default(), today())
            .await
            .unwrap();

        assert_eq!(outcome.status, "daily report (sent)");
        assert_eq!(outcome.data.organic_sessions, 400);
        assert_eq!(outcome.data.total_sessions, 600);
        assert_eq!(sent.load(Ordering::SeqCst), 1);
        assert_eq!(*source.requested.lock().unwrap(), Some((5, 1)));
    }

    #[tokio::test]
    async fn organic_check_flags_missing_traffic() {
        let source = FixedSource::new(vec![
            ReportRow::new("Organic Search", "20250314", "1", "1"),
            ReportRow::new("Direct", "20250314", "200", "150"),
        ]);
        let notifier = Notifier::with_channels(vec![]);

        let outcome = run_organic_check(&source, &notifier, &Config::default(), CheckOptions::default(), today())
            .await
            .unwrap();

        assert_eq!(outcome.status, "no organic traffic");
        assert!(!outcome.email_configured);
        assert!(!outcome.data.has_organic);
    }
}
