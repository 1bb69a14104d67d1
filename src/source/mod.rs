pub mod ga4;
pub mod simulated;

use async_trait::async_trait;

use crate::decoder::ReportRow;
use crate::error::WatchError;

/// Supplies raw channel rows for a window of days.
///
/// Offsets count back from today: `(14, 1)` is the fourteen days ending
/// yesterday. Errors are returned as-is; sources never retry.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Human-readable name for this source
    fn name(&self) -> &str;

    async fn fetch_channel_window(
        &self,
        start_offset_days: u32,
        end_offset_days: u32,
    ) -> Result<Vec<ReportRow>, WatchError>;
}

/// Provides a bearer token for the analytics API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, WatchError>;
}

/// A token obtained out of band and passed in through configuration.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, WatchError> {
        if self.0.trim().is_empty() {
            return Err(WatchError::Credentials("no access token configured".into()));
        }
        Ok(self.0.clone())
    }
}
