//! End-to-end ingest with stubbed speech, images and encoding.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use newsreel_db::repositories::EntryRepo;
use newsreel_db::DbPool;
use newsreel_feed::{RawFeed, RawItem};
use newsreel_pipeline::config::ComposerConfig;
use newsreel_pipeline::encoder::{EncodeError, EncodeJob, VideoEncoder};
use newsreel_pipeline::image_fetch::{ImageFetchError, ImageFetcher};
use newsreel_pipeline::narration::{unique_path, AudioAsset, NarrationError, Narrator};
use newsreel_pipeline::summary::NaiveSummarizer;
use newsreel_pipeline::{BatchRunner, EntryComposer};

struct SilentNarrator;

#[async_trait]
impl Narrator for SilentNarrator {
    async fn synthesize(&self, _text: &str, work_dir: &Path) -> Result<AudioAsset, NarrationError> {
        let path = unique_path(work_dir, "wav");
        tokio::fs::write(&path, b"RIFF").await?;
        Ok(AudioAsset {
            path,
            duration_secs: 1.0,
        })
    }

    async fn adjust_tempo(
        &self,
        asset: &AudioAsset,
        factor: f64,
        _work_dir: &Path,
    ) -> Result<AudioAsset, NarrationError> {
        Ok(AudioAsset {
            path: asset.path.clone(),
            duration_secs: asset.duration_secs / factor,
        })
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

struct BlankImages;

#[async_trait]
impl ImageFetcher for BlankImages {
    async fn fetch(&self, _url: &str) -> Result<RgbImage, ImageFetchError> {
        Ok(RgbImage::new(48, 24))
    }
}

struct TouchEncoder;

#[async_trait]
impl VideoEncoder for TouchEncoder {
    async fn encode(&self, job: EncodeJob) -> Result<(), EncodeError> {
        tokio::fs::write(&job.output, b"video").await?;
        Ok(())
    }
}

async fn test_pool() -> DbPool {
    let pool = newsreel_db::create_pool("sqlite::memory:").await.unwrap();
    newsreel_db::run_migrations(&pool).await.unwrap();
    pool
}

fn runner(output_dir: &Path) -> BatchRunner {
    let config = ComposerConfig {
        output_dir: output_dir.to_path_buf(),
        fps: 5,
        output_width: 8,
        output_height: 16,
        ..ComposerConfig::default()
    };
    let composer = EntryComposer::new(
        Arc::new(NaiveSummarizer),
        Arc::new(SilentNarrator),
        Arc::new(BlankImages),
        Arc::new(TouchEncoder),
        config,
    );
    BatchRunner::with_workers(composer, 2)
}

fn item(title: &str, image: Option<&str>) -> RawItem {
    RawItem {
        title: title.into(),
        summary_text: format!("{title} details."),
        image_url: image.map(str::to_string),
        link: Some(format!("https://news.example.com/{title}")),
    }
}

#[tokio::test]
async fn stores_rendered_and_failed_entries_in_feed_order() {
    let pool = test_pool().await;
    let output = tempfile::tempdir().unwrap();
    let raw = RawFeed {
        title: "Morning Brief".into(),
        items: vec![
            item("alpha", Some("https://img.example.com/a.jpg")),
            item("beta", None),
            item("gamma", Some("https://img.example.com/c.jpg")),
        ],
    };

    let report = newsreel_worker::ingest(&pool, &runner(output.path()), raw, 5)
        .await
        .unwrap();

    assert_eq!(report.feed_title, "Morning Brief");
    assert_eq!(report.saved, 3);
    assert_eq!(report.rendered, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "beta");

    let rows = EntryRepo::list(&pool).await.unwrap();
    let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["alpha", "beta", "gamma"]);

    let alpha_video = rows[0].video_path.as_deref().unwrap();
    assert!(Path::new(alpha_video).exists());
    assert_eq!(rows[0].summary.as_deref(), Some("alpha\nalpha details."));
    assert!(rows[1].video_path.is_none());
    assert!(rows[2].video_path.is_some());

    let videos = newsreel_worker::stored_videos(&pool).await.unwrap();
    let titles: Vec<_> = videos.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(titles, ["alpha", "gamma"]);
    assert_eq!(videos[0].1, Path::new(alpha_video));
}

#[tokio::test]
async fn limit_caps_the_number_of_entries() {
    let pool = test_pool().await;
    let output = tempfile::tempdir().unwrap();
    let raw = RawFeed {
        title: "Busy Day".into(),
        items: (0..8)
            .map(|i| item(&format!("story-{i}"), Some("https://img.example.com/x.jpg")))
            .collect(),
    };

    let report = newsreel_worker::ingest(&pool, &runner(output.path()), raw, 5)
        .await
        .unwrap();

    assert_eq!(report.saved, 5);
    assert_eq!(EntryRepo::list(&pool).await.unwrap().len(), 5);
}
