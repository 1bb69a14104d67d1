use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::pipeline::OrganicSummary;
use crate::types::{Alert, Severity};

/// A rendered notification, ready for any delivery channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub html_body: String,
    /// One-line plain text version for chat channels
    pub summary: String,
    pub severity: Severity,
}

/// Per-run details shown alongside the alerts
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub date: NaiveDate,
    pub window_days: u32,
    pub is_test: bool,
    pub session_trend: Option<f64>,
    /// Share of window sessions per channel, in percent
    pub channel_shares: Vec<(String, f64)>,
}

const TEST_NOTE: &str = "<p><strong>This is a test</strong>: no real problem was detected.</p>";
const FOOTER: &str = "<p style=\"font-size:12px;color:#666\">Generated automatically by channel-watch.</p>";

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn alert_details(alert: &Alert) -> String {
    match alert {
        Alert::SignificantIncrease { previous_avg, current_avg, previous, current, .. } => format!(
            "<p>Previous period ({}): {:.2}%<br>Current period ({}): {:.2}%</p>",
            escape_html(&previous.to_string()),
            previous_avg,
            escape_html(&current.to_string()),
            current_avg
        ),
        Alert::IncreasingTrend { days } => {
            let items: String = days
                .iter()
                .map(|d| format!("<li>{}: {:.2}%</li>", escape_html(&d.date), d.percentage))
                .collect();
            format!("<p>Last days:</p><ul>{}</ul>", items)
        }
        Alert::HighUnassignedDay { date, percentage, sessions } => format!(
            "<p>On {}: {:.2}% ({} sessions)</p>",
            escape_html(date),
            percentage,
            sessions
        ),
    }
}

/// Render the unassigned-traffic alert email.
pub fn unassigned_alert(alerts: &[Alert], ctx: &ReportContext) -> Notification {
    let severity = alerts
        .iter()
        .map(Alert::severity)
        .max()
        .unwrap_or(Severity::Info);

    let subject = format!(
        "Unassigned traffic alert: {} anomal{} - {}",
        alerts.len(),
        if alerts.len() == 1 { "y" } else { "ies" },
        ctx.date
    );

    let mut html = String::new();
    let _ = writeln!(html, "<div style=\"font-family: Arial, sans-serif; padding: 20px; max-width: 600px;\">");
    let _ = writeln!(html, "<h2 style=\"color: #d32f2f;\">Unassigned traffic alert</h2>");
    let _ = writeln!(
        html,
        "<p>Anomalies were detected in unassigned traffic over the last {} days:</p>",
        ctx.window_days
    );

    for alert in alerts {
        let _ = writeln!(
            html,
            "<div style=\"margin-bottom: 16px; padding: 12px; border-left: 4px solid #f44336; background-color: #ffebee;\">"
        );
        let _ = writeln!(html, "<h3 style=\"margin-top: 0;\">{}</h3>", escape_html(&alert.message()));
        let _ = writeln!(html, "{}", alert_details(alert));
        let _ = writeln!(html, "</div>");
    }

    if let Some(trend) = ctx.session_trend {
        let _ = writeln!(
            html,
            "<p>Total sessions versus the previous period: {:+.1}%</p>",
            trend
        );
    }

    if !ctx.channel_shares.is_empty() {
        let _ = writeln!(html, "<p>Channel shares over the window:</p>");
        let _ = writeln!(html, "<ul>");
        for (channel, share) in &ctx.channel_shares {
            let _ = writeln!(html, "<li>{}: {:.2}%</li>", escape_html(channel), share);
        }
        let _ = writeln!(html, "</ul>");
    }

    let _ = writeln!(html, "<p>Things to check:</p>");
    let _ = writeln!(
        html,
        "<ul><li>UTM parameters on recent campaigns</li><li>Analytics tag on every page</li><li>Redirects that strip referrer or query strings</li></ul>"
    );
    if ctx.is_test {
        let _ = writeln!(html, "{}", TEST_NOTE);
    }
    let _ = writeln!(html, "{}", FOOTER);
    let _ = writeln!(html, "</div>");

    let summary = alerts
        .iter()
        .map(Alert::message)
        .collect::<Vec<_>>()
        .join("; ");

    Notification {
        subject,
        html_body: html,
        summary,
        severity,
    }
}

/// Render the daily organic-traffic email: a normal report, or an alert when
/// there is no organic traffic.
pub fn daily_summary(summary: &OrganicSummary, ctx: &ReportContext) -> Notification {
    let mut html = String::new();
    let _ = writeln!(html, "<div style=\"font-family: Arial, sans-serif; padding: 20px; max-width: 600px;\">");

    let (subject, severity, line) = if summary.has_organic {
        let _ = writeln!(html, "<h2 style=\"color: #2e7d32;\">Daily traffic report</h2>");
        let _ = writeln!(
            html,
            "<div style=\"margin-bottom: 20px; padding: 15px; border-left: 4px solid #4caf50; background-color: #e8f5e9;\">"
        );
        let _ = writeln!(
            html,
            "<h3 style=\"margin-top: 0;\">{} sessions in total ({} organic)</h3>",
            summary.total_sessions, summary.organic_sessions
        );
        (
            format!("Daily traffic report - {}", ctx.date),
            Severity::Info,
            format!(
                "{} sessions over {} days, {} organic",
                summary.total_sessions, ctx.window_days, summary.organic_sessions
            ),
        )
    } else {
        let _ = writeln!(html, "<h2 style=\"color: #d32f2f;\">No organic traffic</h2>");
        let _ = writeln!(html, "<p>No organic search traffic was recorded for the period.</p>");
        let _ = writeln!(
            html,
            "<div style=\"margin-bottom: 20px; padding: 15px; border-left: 4px solid #f44336; background-color: #ffebee;\">"
        );
        (
            format!("Alert: no organic traffic - {}", ctx.date),
            Severity::Critical,
            format!(
                "No organic traffic: {} sessions over {} days, {} organic",
                summary.total_sessions, ctx.window_days, summary.organic_sessions
            ),
        )
    };

    let _ = writeln!(html, "<ul>");
    let _ = writeln!(html, "<li>Total sessions: {}</li>", summary.total_sessions);
    let _ = writeln!(html, "<li>Organic sessions: {}</li>", summary.organic_sessions);
    let _ = writeln!(html, "</ul>");
    if summary.has_organic {
        let _ = writeln!(html, "<p>Tracking status: <strong style=\"color: #2e7d32\">operational</strong></p>");
        let _ = writeln!(html, "</div>");
    } else {
        let _ = writeln!(html, "</div>");
        let _ = writeln!(html, "<p>Check that:</p>");
        let _ = writeln!(
            html,
            "<ul><li>the site is still indexed by search engines</li><li>the analytics tag is installed correctly</li></ul>"
        );
    }
    if ctx.is_test {
        let _ = writeln!(html, "{}", TEST_NOTE);
    }
    let _ = writeln!(html, "{}", FOOTER);
    let _ = writeln!(html, "</div>");

    Notification {
        subject,
        html_body: html,
        summary: line,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateRange, TrendPoint};

    fn ctx(is_test: bool) -> ReportContext {
        ReportContext {
            date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            window_days: 14,
            is_test,
            session_trend: None,
            channel_shares: vec![],
        }
    }

    fn sample_alerts() -> Vec<Alert> {
        vec![
            Alert::SignificantIncrease {
                previous_avg: 2.0,
                current_avg: 12.0,
                increase_pct: 500.0,
                previous: DateRange { start: "2025-03-01".into(), end: "2025-03-07".into() },
                current: DateRange { start: "2025-03-08".into(), end: "2025-03-14".into() },
            },
            Alert::IncreasingTrend {
                days: [
                    TrendPoint { date: "2025-03-12".into(), percentage: 3.0 },
                    TrendPoint { date: "2025-03-13".into(), percentage: 5.0 },
                    TrendPoint { date: "2025-03-14".into(), percentage: 7.0 },
                ],
            },
            Alert::HighUnassignedDay {
                date: "2025-03-14".into(),
                percentage: 7.0,
                sessions: 70,
            },
        ]
    }

    #[test]
    fn alert_email_lists_every_alert() {
        let n = unassigned_alert(&sample_alerts(), &ctx(false));
        assert_eq!(n.subject, "Unassigned traffic alert: 3 anomalies - 2025-03-15");
        assert_eq!(n.severity, Severity::Critical);
        assert!(n.html_body.contains("2025-03-01 to 2025-03-07"));
        assert!(n.html_body.contains("<li>2025-03-13: 5.00%</li>"));
        assert!(n.html_body.contains("On 2025-03-14: 7.00% (70 sessions)"));
        assert!(!n.html_body.contains("This is a test"));
        assert_eq!(n.summary.matches("; ").count(), 2);
    }

    #[test]
    fn single_warn_alert_keeps_warn_severity() {
        let alerts = vec![Alert::HighUnassignedDay {
            date: "2025-03-14".into(),
            percentage: 6.0,
            sessions: 12,
        }];
        let n = unassigned_alert(&alerts, &ctx(true));
        assert_eq!(n.severity, Severity::Warn);
        assert!(n.subject.contains("1 anomaly"));
        assert!(n.html_body.contains("This is a test"));
    }

    #[test]
    fn session_trend_is_signed() {
        let mut context = ctx(false);
        context.session_trend = Some(-12.5);
        let n = unassigned_alert(&sample_alerts(), &context);
        assert!(n.html_body.contains("-12.5%"));
    }

    #[test]
    fn channel_shares_are_listed() {
        let mut context = ctx(false);
        context.channel_shares = vec![
            ("Organic Search".to_string(), 41.5),
            ("Direct".to_string(), 30.0),
        ];
        let n = unassigned_alert(&sample_alerts(), &context);
        assert!(n.html_body.contains("<li>Organic Search: 41.50%</li>"));
        assert!(n.html_body.contains("<li>Direct: 30.00%</li>"));
        assert!(!unassigned_alert(&sample_alerts(), &ctx(false)).html_body.contains("Channel shares"));
    }

    #[test]
    fn provider_strings_are_escaped() {
        let alerts = vec![Alert::HighUnassignedDay {
            date: "<b>-x-".into(),
            percentage: 6.0,
            sessions: 12,
        }];
        let n = unassigned_alert(&alerts, &ctx(false));
        assert!(!n.html_body.contains("<b>-x-"));
        assert!(n.html_body.contains("&lt;b&gt;-x-"));
    }

    #[test]
    fn daily_report_when_organic_present() {
        let summary = OrganicSummary { total_sessions: 900, organic_sessions: 360, has_organic: true };
        let n = daily_summary(&summary, &ctx(false));
        assert_eq!(n.subject, "Daily traffic report - 2025-03-15");
        assert_eq!(n.severity, Severity::Info);
        assert!(n.html_body.contains("Organic sessions: 360"));
    }

    #[test]
    fn alert_when_organic_missing() {
        let summary = OrganicSummary { total_sessions: 900, organic_sessions: 0, has_organic: false };
        let n = daily_summary(&summary, &ctx(true));
        assert_eq!(n.subject, "Alert: no organic traffic - 2025-03-15");
        assert_eq!(n.severity, Severity::Critical);
        assert!(n.summary.starts_with("No organic traffic"));
        assert!(n.html_body.contains("This is a test"));
    }
}
