use reqwest::Client;

use crate::error::FeedError;
use crate::models::RawFeed;
use crate::parser::parse_feed;

/// RSS feed fetcher client.
pub struct RssClient {
    client: Client,
}

impl RssClient {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new RssClient with a custom reqwest Client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and parse the feed at `url`.
    pub async fn fetch(&self, url: &str) -> crate::Result<RawFeed> {
        tracing::debug!(%url, "Fetching RSS feed");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let feed = parse_feed(&bytes)?;

        tracing::debug!(title = %feed.title, items = feed.items.len(), "Parsed RSS feed");
        Ok(feed)
    }
}

impl Default for RssClient {
    fn default() -> Self {
        Self::new()
    }
}
