use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsreel_feed::RssClient;
use newsreel_pipeline::{engines, BatchRunner, ComposerConfig, EngineConfig};
use newsreel_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsreel_worker=debug,newsreel_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    let composer_config = ComposerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    tracing::info!(
        feed_url = %config.feed_url,
        feed_limit = config.feed_limit,
        workers = config.batch_workers,
        "Loaded worker configuration",
    );

    if !newsreel_core::ffmpeg::ffmpeg_available().await {
        anyhow::bail!("ffmpeg was not found on PATH");
    }

    // --- Database ---
    let pool = newsreel_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    newsreel_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    // --- Pipeline ---
    tokio::fs::create_dir_all(&composer_config.output_dir)
        .await
        .with_context(|| {
            format!("Failed to create {}", composer_config.output_dir.display())
        })?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let composer = engines::build_composer(composer_config, &engine_config, &http)?;
    let runner = BatchRunner::with_workers(composer, config.batch_workers);

    // --- Ingest ---
    let client = RssClient::with_client(http);
    let report = newsreel_worker::run(&pool, &client, &runner, &config.feed_url, config.feed_limit)
        .await
        .context("Ingest failed")?;

    for (title, error) in &report.failed {
        tracing::warn!(%title, %error, "Entry stored without video");
    }

    for (title, video) in newsreel_worker::stored_videos(&pool)
        .await
        .context("Failed to read stored entries")?
    {
        tracing::info!(%title, video = %video.display(), "Stored video");
    }
    pool.close().await;
    Ok(())
}
