use std::path::PathBuf;

use newsreel_core::error::CoreError;
use newsreel_db::repositories::EntryRepo;
use newsreel_db::DbPool;
use newsreel_feed::{FeedError, RawFeed, RssClient};
use newsreel_pipeline::BatchRunner;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored entry is inconsistent: {0}")]
    Stored(#[from] CoreError),
}

/// What one ingest pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub feed_title: String,
    /// Rows written, rendered or not.
    pub saved: usize,
    pub rendered: usize,
    /// `(title, error)` for every entry without a video.
    pub failed: Vec<(String, String)>,
}

/// Render the first `limit` items of `raw` and store every resulting entry.
///
/// Entries that failed to render are stored too, with a null video.
pub async fn ingest(
    pool: &DbPool,
    runner: &BatchRunner,
    raw: RawFeed,
    limit: usize,
) -> Result<IngestReport, IngestError> {
    let mut feed = raw.into_feed(limit);
    let outcomes = runner.render_all(&mut feed).await;

    let failed: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.title.clone(), e.to_string())),
        })
        .collect();

    let saved = EntryRepo::save_feed(pool, &feed).await?;

    let report = IngestReport {
        feed_title: feed.title.clone(),
        saved: saved.len(),
        rendered: outcomes.len() - failed.len(),
        failed,
    };
    tracing::info!(
        feed = %report.feed_title,
        saved = report.saved,
        rendered = report.rendered,
        failed = report.failed.len(),
        "Ingest finished",
    );
    Ok(report)
}

/// Fetch the feed at `url`, then [`ingest`] it.
pub async fn run(
    pool: &DbPool,
    client: &RssClient,
    runner: &BatchRunner,
    url: &str,
    limit: usize,
) -> Result<IngestReport, IngestError> {
    let raw = client.fetch(url).await?;
    tracing::info!(%url, title = %raw.title, items = raw.items.len(), "Fetched feed");
    ingest(pool, runner, raw, limit).await
}

/// `(title, video)` for every stored entry that has a rendered video, oldest first.
pub async fn stored_videos(pool: &DbPool) -> Result<Vec<(String, PathBuf)>, IngestError> {
    let mut videos = Vec::new();
    for record in EntryRepo::list(pool).await? {
        let entry = record.into_entry()?;
        if let Some(video) = entry.video() {
            videos.push((entry.title.clone(), video.to_path_buf()));
        }
    }
    Ok(videos)
}
