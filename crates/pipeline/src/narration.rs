//! Speech synthesis and tempo adjustment.
//!
//! A [`Narrator`] turns a summary into an [`AudioAsset`] inside a work
//! directory owned by the caller. Every file it creates carries a UUID v4
//! name, so concurrent narrations can share a directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use newsreel_core::ffmpeg::{self, FfmpegError};
use tokio::process::Command;

use crate::openai::{OpenAiClient, OpenAiError};

pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "shimmer";

/// A narration audio file and its playback length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub duration_secs: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("narration text is empty")]
    EmptyText,

    /// The engine ran but left no audible output behind.
    #[error("speech engine produced empty audio at {0}")]
    EmptyAudio(PathBuf),

    #[error("speech engine failed: {0}")]
    Engine(String),

    #[error("speech request failed: {0}")]
    Api(#[from] OpenAiError),

    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A speech engine.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Speak `text` into a new file under `work_dir`.
    async fn synthesize(&self, text: &str, work_dir: &Path) -> Result<AudioAsset, NarrationError>;

    /// Re-time `asset` so it plays `factor` times faster, writing a new file
    /// under `work_dir`. Pitch is not preserved.
    async fn adjust_tempo(
        &self,
        asset: &AudioAsset,
        factor: f64,
        work_dir: &Path,
    ) -> Result<AudioAsset, NarrationError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Unique file name with `extension` inside `dir`.
pub fn unique_path(dir: &Path, extension: &str) -> PathBuf {
    dir.join(format!("{}.{extension}", uuid::Uuid::new_v4()))
}

/// Probe a freshly written file, rejecting zero-byte or zero-length audio.
pub async fn finish_asset(path: PathBuf, timeout: Duration) -> Result<AudioAsset, NarrationError> {
    let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(NarrationError::EmptyAudio(path));
    }
    let duration_secs = ffmpeg::media_duration(&path, timeout).await?;
    if duration_secs.is_nan() || duration_secs <= 0.0 {
        return Err(NarrationError::EmptyAudio(path));
    }
    Ok(AudioAsset {
        path,
        duration_secs,
    })
}

/// Run `asset` through ffmpeg's `atempo` filter into a WAV under `work_dir`.
pub async fn adjust_tempo(
    asset: &AudioAsset,
    factor: f64,
    work_dir: &Path,
    timeout: Duration,
) -> Result<AudioAsset, NarrationError> {
    // Validates the factor before spawning anything.
    ffmpeg::atempo_filter(factor)?;

    let output = unique_path(work_dir, "wav");
    ffmpeg::change_tempo(&asset.path, &output, factor, timeout).await?;
    let adjusted = finish_asset(output, timeout).await?;

    tracing::debug!(
        input_secs = asset.duration_secs,
        output_secs = adjusted.duration_secs,
        factor,
        "Adjusted narration tempo",
    );
    Ok(adjusted)
}

fn require_text(text: &str) -> Result<&str, NarrationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(NarrationError::EmptyText);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// OpenAI text-to-speech
// ---------------------------------------------------------------------------

/// Remote speech through `/audio/speech`, saved as MP3.
pub struct OpenAiNarrator {
    api: OpenAiClient,
    model: String,
    voice: String,
    ffmpeg_timeout: Duration,
}

impl OpenAiNarrator {
    pub fn new(api: OpenAiClient, ffmpeg_timeout: Duration) -> Self {
        Self {
            api,
            model: DEFAULT_SPEECH_MODEL.into(),
            voice: DEFAULT_VOICE.into(),
            ffmpeg_timeout,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn synthesize(&self, text: &str, work_dir: &Path) -> Result<AudioAsset, NarrationError> {
        let text = require_text(text)?;
        let path = unique_path(work_dir, "mp3");

        let bytes = self
            .api
            .speech_to_file(&self.model, &self.voice, text, &path)
            .await?;
        tracing::debug!(path = %path.display(), bytes, voice = %self.voice, "Narration downloaded");

        finish_asset(path, self.ffmpeg_timeout).await
    }

    async fn adjust_tempo(
        &self,
        asset: &AudioAsset,
        factor: f64,
        work_dir: &Path,
    ) -> Result<AudioAsset, NarrationError> {
        adjust_tempo(asset, factor, work_dir, self.ffmpeg_timeout).await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ---------------------------------------------------------------------------
// espeak-ng
// ---------------------------------------------------------------------------

/// Local speech through the `espeak-ng` binary, saved as WAV.
pub struct EspeakNarrator {
    voice: String,
    timeout: Duration,
}

impl EspeakNarrator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            voice: "en".into(),
            timeout,
        }
    }
}

#[async_trait]
impl Narrator for EspeakNarrator {
    async fn synthesize(&self, text: &str, work_dir: &Path) -> Result<AudioAsset, NarrationError> {
        let text = require_text(text)?;
        let path = unique_path(work_dir, "wav");

        let mut cmd = Command::new("espeak-ng");
        cmd.args(["-v", &self.voice, "-w"])
            .arg(&path)
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| NarrationError::Engine(format!("espeak-ng timed out after {:?}", self.timeout)))?
            .map_err(|e| NarrationError::Engine(format!("failed to spawn espeak-ng: {e}")))?;

        if !output.status.success() {
            return Err(NarrationError::Engine(format!(
                "espeak-ng exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        finish_asset(path, self.timeout).await
    }

    async fn adjust_tempo(
        &self,
        asset: &AudioAsset,
        factor: f64,
        work_dir: &Path,
    ) -> Result<AudioAsset, NarrationError> {
        adjust_tempo(asset, factor, work_dir, self.timeout).await
    }

    fn name(&self) -> &'static str {
        "espeak"
    }
}
