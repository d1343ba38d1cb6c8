use newsreel_feed::DEFAULT_ENTRY_LIMIT;
use newsreel_pipeline::batch::default_workers;
use newsreel_pipeline::config::env_parse;

/// Default feed: the New York Times home page.
pub const DEFAULT_FEED_URL: &str = "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml";

/// Ingest configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub feed_url: String,
    /// Number of feed items turned into entries (default: `5`).
    pub feed_limit: usize,
    /// Entries rendered concurrently (default: available parallelism).
    pub batch_workers: usize,
    /// Timeout for feed, image and API requests in seconds (default: `60`).
    pub http_timeout_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default                       |
    /// |---------------------|-------------------------------|
    /// | `DATABASE_URL`      | `sqlite:newsreel.db?mode=rwc` |
    /// | `FEED_URL`          | NYT home page feed            |
    /// | `FEED_LIMIT`        | `5`                           |
    /// | `BATCH_WORKERS`     | available parallelism         |
    /// | `HTTP_TIMEOUT_SECS` | `60`                          |
    pub fn from_env() -> Self {
        let batch_workers: usize = env_parse("BATCH_WORKERS", default_workers());
        assert!(batch_workers > 0, "BATCH_WORKERS must be positive");

        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:newsreel.db?mode=rwc".into()),
            feed_url: std::env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.into()),
            feed_limit: env_parse("FEED_LIMIT", DEFAULT_ENTRY_LIMIT),
            batch_workers,
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", 60),
        }
    }
}
