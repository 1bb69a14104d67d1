/// Errors raised while fetching and decoding a channel window.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// A metric value was not a non-negative integer
    #[error("Malformed {field} metric: {value:?}")]
    MalformedMetric { field: &'static str, value: String },

    /// The analytics provider answered with a non-success status
    #[error("Provider fetch failed ({status}): {body}")]
    ProviderFetchFailed { status: u16, body: String },

    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}
