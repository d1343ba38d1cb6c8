use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse RSS feed: {0}")]
    Parse(String),
}
