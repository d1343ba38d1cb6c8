use std::path::PathBuf;
use std::time::Duration;

use newsreel_core::pan::{PanSettings, PanSpeed, DEFAULT_FPS, DEFAULT_OUTPUT_HEIGHT, DEFAULT_OUTPUT_WIDTH};

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Rendering configuration shared by every composition in a process.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Directory finished videos are written to (default: `static/videos`).
    pub output_dir: PathBuf,
    /// Output frame rate (default: `24`).
    pub fps: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// Visual-only lead-in and lead-out around the narration, in seconds.
    pub wipe_time_secs: f64,
    /// Narration speed-up applied before panning (default: `1.3`).
    pub tempo_factor: f64,
    pub pan_speed: PanSpeed,
    pub video_codec: String,
    pub video_container: String,
    pub video_preset: String,
    /// Burn the entry title into the lower-left corner.
    pub title_overlay: bool,
    /// Font used by the title overlay; ffmpeg's default when unset.
    pub title_font: Option<PathBuf>,
    /// Limit for any single ffmpeg/ffprobe invocation.
    pub ffmpeg_timeout: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static/videos"),
            fps: DEFAULT_FPS,
            output_width: DEFAULT_OUTPUT_WIDTH,
            output_height: DEFAULT_OUTPUT_HEIGHT,
            wipe_time_secs: 1.0,
            tempo_factor: 1.3,
            pan_speed: PanSpeed::Slow,
            video_codec: "libx264".into(),
            video_container: "mp4".into(),
            video_preset: "ultrafast".into(),
            title_overlay: false,
            title_font: None,
            ffmpeg_timeout: Duration::from_secs(600),
        }
    }
}

impl ComposerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default         |
    /// |-----------------------|-----------------|
    /// | `OUTPUT_DIR`          | `static/videos` |
    /// | `VIDEO_FPS`           | `24`            |
    /// | `VIDEO_WIDTH`         | `1080`          |
    /// | `VIDEO_HEIGHT`        | `1920`          |
    /// | `WIPE_TIME_SECS`      | `1.0`           |
    /// | `TEMPO_FACTOR`        | `1.3`           |
    /// | `PAN_SPEED`           | `slow`          |
    /// | `VIDEO_CODEC`         | `libx264`       |
    /// | `VIDEO_CONTAINER`     | `mp4`           |
    /// | `VIDEO_PRESET`        | `ultrafast`     |
    /// | `TITLE_OVERLAY`       | `false`         |
    /// | `TITLE_FONT`          | unset           |
    /// | `FFMPEG_TIMEOUT_SECS` | `600`           |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fps: u32 = env_parse("VIDEO_FPS", defaults.fps);
        assert!(fps > 0, "VIDEO_FPS must be positive");

        let wipe_time_secs: f64 = env_parse("WIPE_TIME_SECS", defaults.wipe_time_secs);
        assert!(
            wipe_time_secs.is_finite() && wipe_time_secs >= 0.0,
            "WIPE_TIME_SECS must be a non-negative number"
        );

        let tempo_factor: f64 = env_parse("TEMPO_FACTOR", defaults.tempo_factor);
        assert!(
            tempo_factor.is_finite() && tempo_factor > 0.0,
            "TEMPO_FACTOR must be a positive number"
        );

        let title_overlay = std::env::var("TITLE_OVERLAY")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.title_overlay);

        Self {
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            fps,
            output_width: env_parse("VIDEO_WIDTH", defaults.output_width),
            output_height: env_parse("VIDEO_HEIGHT", defaults.output_height),
            wipe_time_secs,
            tempo_factor,
            pan_speed: std::env::var("PAN_SPEED")
                .map(|v| PanSpeed::from_name(&v))
                .unwrap_or(defaults.pan_speed),
            video_codec: std::env::var("VIDEO_CODEC").unwrap_or(defaults.video_codec),
            video_container: std::env::var("VIDEO_CONTAINER").unwrap_or(defaults.video_container),
            video_preset: std::env::var("VIDEO_PRESET").unwrap_or(defaults.video_preset),
            title_overlay,
            title_font: std::env::var("TITLE_FONT").ok().map(PathBuf::from),
            ffmpeg_timeout: Duration::from_secs(env_parse(
                "FFMPEG_TIMEOUT_SECS",
                defaults.ffmpeg_timeout.as_secs(),
            )),
        }
    }

    /// Pan geometry derived from the output settings.
    pub fn pan_settings(&self) -> PanSettings {
        PanSettings {
            output_width: self.output_width,
            output_height: self.output_height,
            fps: self.fps,
            speed: self.pan_speed,
        }
    }
}

/// Which summarization strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummarizerKind {
    #[default]
    Naive,
    /// Chat completion with the naive strategy as fallback.
    OpenAi,
}

/// Which speech engine to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarratorKind {
    #[default]
    OpenAi,
    Espeak,
}

/// Strategy selection plus credentials for the OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub summarizer: SummarizerKind,
    pub narrator: NarratorKind,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
}

impl EngineConfig {
    /// Load engine selection from environment variables.
    ///
    /// | Env Var           | Default                     |
    /// |-------------------|-----------------------------|
    /// | `SUMMARIZER`      | `naive` (`openai`)          |
    /// | `NARRATOR`        | `openai` (`espeak`)         |
    /// | `OPENAI_API_KEY`  | unset                       |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    pub fn from_env() -> Self {
        let summarizer = match std::env::var("SUMMARIZER").as_deref().map(str::trim) {
            Ok("openai") => SummarizerKind::OpenAi,
            Ok("naive") | Err(_) => SummarizerKind::Naive,
            Ok(other) => panic!("SUMMARIZER must be 'naive' or 'openai', got '{other}'"),
        };
        let narrator = match std::env::var("NARRATOR").as_deref().map(str::trim) {
            Ok("espeak") => NarratorKind::Espeak,
            Ok("openai") | Err(_) => NarratorKind::OpenAi,
            Ok(other) => panic!("NARRATOR must be 'openai' or 'espeak', got '{other}'"),
        };

        Self {
            summarizer,
            narrator,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.into()),
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
///
/// Panics with the variable name when the value is present but malformed.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
