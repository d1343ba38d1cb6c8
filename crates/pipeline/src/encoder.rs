//! Final video encoding.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use newsreel_core::ffmpeg::{self, FfmpegError, MuxSpec};
use newsreel_core::pan::FrameSequence;

use crate::config::ComposerConfig;

const TITLE_FONT_SIZE: u32 = 48;
const TITLE_COLOR: &str = "white";
const TITLE_MARGIN: u32 = 40;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to write one clip.
#[derive(Debug)]
pub struct EncodeJob {
    pub frames: FrameSequence,
    pub audio: PathBuf,
    pub output: PathBuf,
    /// Frames to write; the last frame is held once the sequence runs out.
    pub total_frames: usize,
    /// Silence before the narration starts.
    pub audio_offset_secs: f64,
    /// Label burned into the clip, if any.
    pub title: Option<String>,
    /// Scratch directory for helper files.
    pub work_dir: PathBuf,
}

/// Muxes a frame sequence with narration into a video file.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, job: EncodeJob) -> Result<(), EncodeError>;
}

/// Encoder backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    codec: String,
    container: String,
    preset: String,
    font: Option<PathBuf>,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self {
            codec: config.video_codec.clone(),
            container: config.video_container.clone(),
            preset: config.video_preset.clone(),
            font: config.title_font.clone(),
            timeout: config.ffmpeg_timeout,
        }
    }

    /// Write `title` to a text file for `drawtext` and return the filter.
    async fn title_filter(&self, title: &str, work_dir: &Path) -> Result<String, EncodeError> {
        let textfile = work_dir.join(format!("{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&textfile, title.trim()).await?;
        Ok(ffmpeg::drawtext_filter(
            &textfile,
            self.font.as_deref(),
            TITLE_FONT_SIZE,
            TITLE_COLOR,
            TITLE_MARGIN,
        ))
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, job: EncodeJob) -> Result<(), EncodeError> {
        let overlay_filter = match job.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => Some(self.title_filter(title, &job.work_dir).await?),
            None => None,
        };

        let spec = MuxSpec {
            codec: self.codec.clone(),
            container: self.container.clone(),
            preset: self.preset.clone(),
            audio_offset_secs: job.audio_offset_secs,
            total_frames: job.total_frames,
            overlay_filter,
            timeout: self.timeout,
        };

        tracing::debug!(
            output = %job.output.display(),
            frames = job.frames.len(),
            total_frames = job.total_frames,
            codec = %spec.codec,
            "Encoding video",
        );
        ffmpeg::mux_frames(job.frames, &job.audio, &job.output, &spec).await?;
        Ok(())
    }
}
