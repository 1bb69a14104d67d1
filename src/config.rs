use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub unassigned: WindowConfig,
    #[serde(default)]
    pub organic: OrganicConfig,
    #[serde(default)]
    pub alerting: AlertingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

/// Analytics data provider
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_property_id")]
    pub property_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_channel_dimension")]
    pub channel_dimension: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            property_id: default_property_id(),
            endpoint: default_endpoint(),
            access_token: String::new(),
            channel_dimension: default_channel_dimension(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Thresholds for the unassigned-traffic rules
#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    #[serde(default = "default_10")]
    pub increase_threshold_pct: f64,
    #[serde(default = "default_5")]
    pub high_day_threshold_pct: f64,
    #[serde(default = "default_10")]
    pub trend_relative_increase_pct: f64,
    #[serde(default = "default_high_day_lookback")]
    pub high_day_lookback: usize,
    #[serde(default = "default_unassigned_label")]
    pub unassigned_label: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            increase_threshold_pct: 10.0,
            high_day_threshold_pct: 5.0,
            trend_relative_increase_pct: 10.0,
            high_day_lookback: 7,
            unassigned_label: default_unassigned_label(),
        }
    }
}

/// Fetch window, in days back from today
#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_unassigned_window")]
    pub window_days: u32,
    #[serde(default = "default_end_offset")]
    pub end_offset_days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { window_days: 14, end_offset_days: 1 }
    }
}

impl WindowConfig {
    /// Offset of the first day fetched; the window ends at `end_offset_days`.
    pub fn start_offset_days(&self) -> u32 {
        self.end_offset_days.saturating_add(self.window_days.max(1) - 1)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrganicConfig {
    #[serde(default = "default_organic_window")]
    pub window_days: u32,
    #[serde(default = "default_end_offset")]
    pub end_offset_days: u32,
    /// Compared case-sensitively, unlike the unassigned label.
    #[serde(default = "default_organic_label")]
    pub channel_label: String,
    /// Organic sessions at or below this count raise the no-traffic alert.
    #[serde(default = "default_min_sessions")]
    pub min_sessions: u64,
}

impl Default for OrganicConfig {
    fn default() -> Self {
        Self {
            window_days: 5,
            end_offset_days: 1,
            channel_label: default_organic_label(),
            min_sessions: 1,
        }
    }
}

impl OrganicConfig {
    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            window_days: self.window_days,
            end_offset_days: self.end_offset_days,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AlertingConfig {
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub slack: Option<SlackConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_email_api")]
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub to: Vec<String>,
    #[serde(default)]
    pub severity_filter: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub severity_filter: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackConfig {
    #[serde(default)]
    pub enabled: bool,
    pub webhook_url: String,
    pub channel: Option<String>,
    #[serde(default)]
    pub severity_filter: Vec<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        // Expand environment variables
        let expanded = expand_env_vars(content)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| "Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.detector.high_day_lookback == 0 {
            anyhow::bail!("detector.high_day_lookback must be at least 1");
        }
        if let Some(ref email) = self.alerting.email {
            if email.enabled && email.to.is_empty() {
                anyhow::bail!("alerting.email.to must list at least one recipient");
            }
        }
        Ok(())
    }
}

/// Expand ${ENV_VAR} references in config string
fn expand_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").context("invalid env pattern")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string())
}

// Default value functions
fn default_log_level() -> String { "info".to_string() }
fn default_property_id() -> String { "470974790".to_string() }
fn default_endpoint() -> String { "https://analyticsdata.googleapis.com/v1beta".to_string() }
fn default_channel_dimension() -> String { "sessionDefaultChannelGroup".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_5() -> f64 { 5.0 }
fn default_10() -> f64 { 10.0 }
fn default_high_day_lookback() -> usize { 7 }
fn default_unassigned_label() -> String { "unassigned".to_string() }
fn default_unassigned_window() -> u32 { 14 }
fn default_organic_window() -> u32 { 5 }
fn default_end_offset() -> u32 { 1 }
fn default_organic_label() -> String { "Organic Search".to_string() }
fn default_min_sessions() -> u64 { 1 }
fn default_email_api() -> String { "https://api.resend.com/emails".to_string() }
