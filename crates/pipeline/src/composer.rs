//! Per-entry video composition.
//!
//! [`EntryComposer::get_video`] drives one [`Entry`] through
//! summarize → fetch image → narrate → re-time → pan → encode → write. The
//! summary and video are recorded on the entry as they are produced; an entry
//! that already has a video is returned as-is without touching any engine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use newsreel_core::entry::Entry;
use newsreel_core::error::CoreError;
use newsreel_core::pan;

use crate::config::ComposerConfig;
use crate::encoder::{EncodeError, EncodeJob, VideoEncoder};
use crate::image_fetch::{ImageFetchError, ImageFetcher};
use crate::narration::{NarrationError, Narrator};
use crate::summary::{SummaryError, Summarizer};

/// Progress of one composition, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionStage {
    New,
    Summarized,
    Narrated,
    TempoAdjusted,
    FramesGenerated,
    Muxed,
    Written,
}

impl CompositionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Summarized => "summarized",
            Self::Narrated => "narrated",
            Self::TempoAdjusted => "tempo_adjusted",
            Self::FramesGenerated => "frames_generated",
            Self::Muxed => "muxed",
            Self::Written => "written",
        }
    }
}

impl fmt::Display for CompositionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one entry could not be turned into a video.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("'{title}': no title or body text to summarize")]
    MissingContent { title: String },

    #[error("'{title}': entry has no image")]
    MissingImage { title: String },

    #[error("'{title}': summary failed: {source}")]
    Summary {
        title: String,
        #[source]
        source: SummaryError,
    },

    #[error("'{title}': narration failed: {source}")]
    Synthesis {
        title: String,
        #[source]
        source: NarrationError,
    },

    #[error("'{title}': image unavailable: {source}")]
    ImageUnavailable {
        title: String,
        #[source]
        source: ImageFetchError,
    },

    #[error("'{title}': encoding failed: {reason}")]
    Encoding { title: String, reason: String },

    #[error("'{title}': work directory error: {source}")]
    Workspace {
        title: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{title}': {source}")]
    State {
        title: String,
        #[source]
        source: CoreError,
    },
}

impl ComposeError {
    /// Title of the entry the error belongs to.
    pub fn title(&self) -> &str {
        match self {
            Self::MissingContent { title }
            | Self::MissingImage { title }
            | Self::Summary { title, .. }
            | Self::Synthesis { title, .. }
            | Self::ImageUnavailable { title, .. }
            | Self::Encoding { title, .. }
            | Self::Workspace { title, .. }
            | Self::State { title, .. } => title,
        }
    }

    /// Stable snake_case name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingContent { .. } => "missing_content",
            Self::MissingImage { .. } => "missing_image",
            Self::Summary { .. } => "summary",
            Self::Synthesis { .. } => "synthesis",
            Self::ImageUnavailable { .. } => "image_unavailable",
            Self::Encoding { .. } => "encoding",
            Self::Workspace { .. } => "workspace",
            Self::State { .. } => "state",
        }
    }
}

/// Composes entry videos from pluggable engines.
///
/// Cheap to clone; clones share the engines and configuration.
#[derive(Clone)]
pub struct EntryComposer {
    summarizer: Arc<dyn Summarizer>,
    narrator: Arc<dyn Narrator>,
    images: Arc<dyn ImageFetcher>,
    encoder: Arc<dyn VideoEncoder>,
    config: Arc<ComposerConfig>,
}

impl EntryComposer {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        narrator: Arc<dyn Narrator>,
        images: Arc<dyn ImageFetcher>,
        encoder: Arc<dyn VideoEncoder>,
        config: ComposerConfig,
    ) -> Self {
        Self {
            summarizer,
            narrator,
            images,
            encoder,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Fill in the entry's summary unless it already has one.
    pub async fn ensure_summary<'a>(&self, entry: &'a mut Entry) -> Result<&'a str, ComposeError> {
        if entry.summary().is_none() {
            if !entry.has_content() {
                return Err(ComposeError::MissingContent {
                    title: entry.title.clone(),
                });
            }
            let summary = self
                .summarizer
                .summarize(&entry.title, &entry.text)
                .await
                .map_err(|source| match source {
                    SummaryError::MissingContent => ComposeError::MissingContent {
                        title: entry.title.clone(),
                    },
                    source => ComposeError::Summary {
                        title: entry.title.clone(),
                        source,
                    },
                })?;
            let title = entry.title.clone();
            entry
                .set_summary(summary)
                .map_err(|source| ComposeError::State { title, source })?;
            log_stage(entry, CompositionStage::Summarized);
        }
        Ok(entry.summary().unwrap_or_default())
    }

    /// Produce the entry's video, or return the one it already has.
    ///
    /// Intermediate files go into a fresh sub-directory of `work_dir`, which
    /// is removed again before returning.
    pub async fn get_video(&self, entry: &mut Entry, work_dir: &Path) -> Result<PathBuf, ComposeError> {
        if let Some(video) = entry.video() {
            tracing::debug!(title = %entry.title, video = %video.display(), "Video already rendered");
            return Ok(video.to_path_buf());
        }
        log_stage(entry, CompositionStage::New);

        // Checked before any engine is called.
        let image_url = match entry.image.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                return Err(ComposeError::MissingImage {
                    title: entry.title.clone(),
                })
            }
        };

        let summary = self.ensure_summary(entry).await?.to_string();

        let scratch = work_dir.join(uuid::Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&scratch)
            .await
            .map_err(|source| ComposeError::Workspace {
                title: entry.title.clone(),
                source,
            })?;

        let result = self.render(entry, &summary, &image_url, &scratch).await;
        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            tracing::warn!(dir = %scratch.display(), error = %e, "Failed to remove scratch directory");
        }
        let output = result?;

        let title = entry.title.clone();
        let video = entry
            .set_video(output)
            .map_err(|source| ComposeError::State { title, source })?
            .to_path_buf();
        log_stage(entry, CompositionStage::Written);
        Ok(video)
    }

    /// Narrate, pan and encode into the output directory.
    async fn render(
        &self,
        entry: &Entry,
        summary: &str,
        image_url: &str,
        scratch: &Path,
    ) -> Result<PathBuf, ComposeError> {
        let title = || entry.title.clone();
        let config = &self.config;

        // No speech is synthesized for an image that cannot be used.
        let source_image = self
            .images
            .fetch(image_url)
            .await
            .map_err(|source| ComposeError::ImageUnavailable { title: title(), source })?;

        let narration = self
            .narrator
            .synthesize(summary, scratch)
            .await
            .map_err(|source| ComposeError::Synthesis { title: title(), source })?;
        log_stage(entry, CompositionStage::Narrated);

        let narration = self
            .narrator
            .adjust_tempo(&narration, config.tempo_factor, scratch)
            .await
            .map_err(|source| ComposeError::Synthesis { title: title(), source })?;
        log_stage(entry, CompositionStage::TempoAdjusted);

        let target_secs = narration.duration_secs + 2.0 * config.wipe_time_secs;
        let settings = config.pan_settings();
        let frames = tokio::task::spawn_blocking(move || pan::pan(&source_image, target_secs, &settings))
            .await
            .map_err(|e| ComposeError::Encoding {
                title: title(),
                reason: format!("pan task failed: {e}"),
            })?;
        log_stage(entry, CompositionStage::FramesGenerated);

        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| ComposeError::Encoding {
                title: title(),
                reason: format!("cannot create {}: {e}", config.output_dir.display()),
            })?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), config.video_container);
        let output = config.output_dir.join(&file_name);
        let partial = config.output_dir.join(format!("{file_name}.part"));

        let job = EncodeJob {
            frames,
            audio: narration.path.clone(),
            output: partial.clone(),
            total_frames: target_frame_count(target_secs, config.fps),
            audio_offset_secs: config.wipe_time_secs,
            title: config.title_overlay.then(title),
            work_dir: scratch.to_path_buf(),
        };

        let written = match self.encoder.encode(job).await {
            Ok(()) => tokio::fs::rename(&partial, &output).await.map_err(EncodeError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(ComposeError::Encoding {
                title: title(),
                reason: e.to_string(),
            });
        }
        log_stage(entry, CompositionStage::Muxed);

        Ok(output)
    }
}

/// Frames needed so the clip lasts at least `target_secs`.
pub fn target_frame_count(target_secs: f64, fps: u32) -> usize {
    if !target_secs.is_finite() || target_secs <= 0.0 {
        return 0;
    }
    (target_secs * fps as f64).ceil() as usize
}

fn log_stage(entry: &Entry, stage: CompositionStage) {
    tracing::info!(title = %entry.title, stage = %stage, "Composition stage reached");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_frames_round_up() {
        assert_eq!(target_frame_count(9.69, 24), 233);
        assert_eq!(target_frame_count(2.0, 24), 48);
        assert_eq!(target_frame_count(0.0, 24), 0);
    }

    #[test]
    fn error_reports_entry_title() {
        let err = ComposeError::MissingImage {
            title: "Storm".into(),
        };
        assert_eq!(err.title(), "Storm");
        assert_eq!(err.kind(), "missing_image");
        assert!(err.to_string().contains("Storm"));
    }

    #[test]
    fn stages_have_stable_names() {
        assert_eq!(CompositionStage::TempoAdjusted.to_string(), "tempo_adjusted");
    }
}
