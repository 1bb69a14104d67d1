pub mod aggregator;
pub mod checks;
pub mod config;
pub mod decoder;
pub mod detector;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod report;
pub mod source;

/// Common types used across modules
pub mod types {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    /// One decoded observation: a single channel on a single day.
    ///
    /// `date` is always the `YYYY-MM-DD` form produced by the decoder. Ordering
    /// of days elsewhere in the crate is a plain string comparison, which is
    /// only correct while dates stay zero-padded ISO strings.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChannelRow {
        pub channel: String,
        pub date: String,
        pub sessions: u64,
        pub users: u64,
    }

    /// Sessions for one date, in total and per channel.
    /// `total` always equals the sum of `channels`.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    pub struct DailyTotal {
        pub total: u64,
        pub channels: BTreeMap<String, u64>,
    }

    /// Sessions for one channel over the whole window, in total and per date.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    pub struct ChannelTotal {
        pub total: u64,
        pub dates: BTreeMap<String, u64>,
    }

    /// The unassigned channel on one date, with its share of that day's sessions.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct UnassignedDay {
        pub date: String,
        pub sessions: u64,
        pub users: u64,
        /// Percent of the day's total sessions, rounded to 2 decimals.
        pub percentage: f64,
    }

    /// Inclusive range of dates covered by a detection period
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct DateRange {
        pub start: String,
        pub end: String,
    }

    impl DateRange {
        /// Range spanning the first and last day of a non-empty slice.
        pub fn spanning(days: &[UnassignedDay]) -> Option<Self> {
            Some(Self {
                start: days.first()?.date.clone(),
                end: days.last()?.date.clone(),
            })
        }
    }

    impl std::fmt::Display for DateRange {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} to {}", self.start, self.end)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct TrendPoint {
        pub date: String,
        pub percentage: f64,
    }

    /// Alert severity levels
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Severity {
        Info,
        Warn,
        Critical,
    }

    impl std::fmt::Display for Severity {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Severity::Info => write!(f, "INFO"),
                Severity::Warn => write!(f, "WARN"),
                Severity::Critical => write!(f, "CRITICAL"),
            }
        }
    }

    /// High-day alerts above this share are critical rather than warnings.
    pub const HIGH_DAY_CRITICAL_PCT: f64 = 10.0;

    /// An anomaly found in the unassigned time series.
    ///
    /// One variant per detection rule, each carrying the evidence that fired it.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Alert {
        /// The recent half of the window averages a much larger share than the earlier half.
        SignificantIncrease {
            previous_avg: f64,
            current_avg: f64,
            /// Relative change, computed from the unrounded averages
            increase_pct: f64,
            previous: DateRange,
            current: DateRange,
        },
        /// The share rose on each of the last three days.
        IncreasingTrend { days: [TrendPoint; 3] },
        /// The worst recent day above the high-day threshold.
        HighUnassignedDay {
            date: String,
            percentage: f64,
            sessions: u64,
        },
    }

    impl Alert {
        pub fn kind(&self) -> &'static str {
            match self {
                Alert::SignificantIncrease { .. } => "SIGNIFICANT_INCREASE",
                Alert::IncreasingTrend { .. } => "INCREASING_TREND",
                Alert::HighUnassignedDay { .. } => "HIGH_UNASSIGNED_DAY",
            }
        }

        pub fn severity(&self) -> Severity {
            match self {
                Alert::HighUnassignedDay { percentage, .. } if *percentage <= HIGH_DAY_CRITICAL_PCT => {
                    Severity::Warn
                }
                _ => Severity::Critical,
            }
        }

        pub fn message(&self) -> String {
            match self {
                Alert::SignificantIncrease { previous_avg, current_avg, increase_pct, .. } => format!(
                    "Unassigned traffic share up {:.1}% ({:.2}% -> {:.2}%)",
                    increase_pct, previous_avg, current_avg
                ),
                Alert::IncreasingTrend { days } => format!(
                    "Unassigned traffic share rising for 3 consecutive days ({} to {})",
                    days[0].date, days[2].date
                ),
                Alert::HighUnassignedDay { date, percentage, sessions } => format!(
                    "High unassigned traffic on {}: {:.2}% ({} sessions)",
                    date, percentage, sessions
                ),
            }
        }
    }

}
