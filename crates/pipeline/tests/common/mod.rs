//! Stub engines with call counters for composer and batch tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use newsreel_core::entry::Entry;
use newsreel_core::pan::PanSpeed;
use newsreel_pipeline::composer::EntryComposer;
use newsreel_pipeline::config::ComposerConfig;
use newsreel_pipeline::encoder::{EncodeError, EncodeJob, VideoEncoder};
use newsreel_pipeline::image_fetch::{ImageFetchError, ImageFetcher};
use newsreel_pipeline::narration::{unique_path, AudioAsset, NarrationError, Narrator};
use newsreel_pipeline::summary::{NaiveSummarizer, Summarizer, SummaryError};

/// Narration length every stub synthesis reports.
pub const STUB_AUDIO_SECS: f64 = 2.0;

// ---------------------------------------------------------------------------
// Summarizer
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingSummarizer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, SummaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        NaiveSummarizer.summarize(title, body).await
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

// ---------------------------------------------------------------------------
// Narrator
// ---------------------------------------------------------------------------

/// Writes placeholder audio files. Delays are keyed by the first line of the
/// text, which is the entry title for naive summaries.
#[derive(Default)]
pub struct StubNarrator {
    pub calls: AtomicUsize,
    pub tempo_calls: AtomicUsize,
    pub delays: HashMap<String, Duration>,
    pub texts: Mutex<Vec<String>>,
    /// First lines in the order synthesis finished.
    pub finished: Mutex<Vec<String>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl StubNarrator {
    pub fn with_delays(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(title, ms)| (title.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Narrator for StubNarrator {
    async fn synthesize(&self, text: &str, work_dir: &Path) -> Result<AudioAsset, NarrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        let first_line = text.lines().next().unwrap_or_default().to_string();
        if first_line.contains("PANIC") {
            panic!("narrator exploded on {first_line}");
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        let delay = self.delays.get(&first_line).copied().unwrap_or(Duration::from_millis(5));
        tokio::time::sleep(delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let path = unique_path(work_dir, "wav");
        tokio::fs::write(&path, b"RIFF").await?;
        self.finished.lock().unwrap().push(first_line);
        Ok(AudioAsset {
            path,
            duration_secs: STUB_AUDIO_SECS,
        })
    }

    async fn adjust_tempo(
        &self,
        asset: &AudioAsset,
        factor: f64,
        work_dir: &Path,
    ) -> Result<AudioAsset, NarrationError> {
        self.tempo_calls.fetch_add(1, Ordering::SeqCst);
        let path = unique_path(work_dir, "wav");
        tokio::fs::copy(&asset.path, &path).await?;
        Ok(AudioAsset {
            path,
            duration_secs: asset.duration_secs / factor,
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StubImages {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageFetcher for StubImages {
    async fn fetch(&self, url: &str) -> Result<RgbImage, ImageFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(ImageFetchError::Decode("corrupt image".into()));
        }
        Ok(RgbImage::from_fn(64, 32, |x, _| Rgb([(x * 4) as u8, 0, 0])))
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// What the encoder was asked to do.
#[derive(Debug, Clone)]
pub struct EncodedClip {
    pub output: PathBuf,
    pub frames: usize,
    pub total_frames: usize,
    pub fps: u32,
    pub audio_offset_secs: f64,
    pub title: Option<String>,
}

#[derive(Default)]
pub struct StubEncoder {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub clips: Mutex<Vec<EncodedClip>>,
}

#[async_trait]
impl VideoEncoder for StubEncoder {
    async fn encode(&self, job: EncodeJob) -> Result<(), EncodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(&job.output, b"video").await?;
        self.clips.lock().unwrap().push(EncodedClip {
            output: job.output.clone(),
            frames: job.frames.len(),
            total_frames: job.total_frames,
            fps: job.frames.fps(),
            audio_offset_secs: job.audio_offset_secs,
            title: job.title.clone(),
        });
        if self.fail {
            return Err(EncodeError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub summarizer: Arc<CountingSummarizer>,
    pub narrator: Arc<StubNarrator>,
    pub images: Arc<StubImages>,
    pub encoder: Arc<StubEncoder>,
    pub composer: EntryComposer,
    pub output_dir: PathBuf,
    pub work_dir: PathBuf,
    _root: tempfile::TempDir,
}

pub fn small_config(output_dir: PathBuf) -> ComposerConfig {
    ComposerConfig {
        output_dir,
        fps: 10,
        output_width: 16,
        output_height: 32,
        pan_speed: PanSpeed::Slow,
        ..ComposerConfig::default()
    }
}

pub fn harness(narrator: StubNarrator, encoder: StubEncoder) -> Harness {
    harness_with(narrator, encoder, |_| {})
}

pub fn harness_with(
    narrator: StubNarrator,
    encoder: StubEncoder,
    tweak: impl FnOnce(&mut ComposerConfig),
) -> Harness {
    let root = tempfile::tempdir().unwrap();
    let output_dir = root.path().join("videos");
    let work_dir = root.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();

    let mut config = small_config(output_dir.clone());
    tweak(&mut config);

    let summarizer = Arc::new(CountingSummarizer::default());
    let narrator = Arc::new(narrator);
    let images = Arc::new(StubImages::default());
    let encoder = Arc::new(encoder);
    let composer = EntryComposer::new(
        summarizer.clone(),
        narrator.clone(),
        images.clone(),
        encoder.clone(),
        config,
    );

    Harness {
        summarizer,
        narrator,
        images,
        encoder,
        composer,
        output_dir,
        work_dir,
        _root: root,
    }
}

pub fn entry(title: &str) -> Entry {
    Entry::new(
        title,
        format!("Body of {title}."),
        Some(format!("https://img.example.com/{}.jpg", title.replace(' ', "-"))),
        Some(format!("https://news.example.com/{}", title.replace(' ', "-"))),
    )
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
