//! FFmpeg/FFprobe command utilities.
//!
//! Every `ffmpeg` and `ffprobe` invocation in the workspace goes through
//! this module: media probing, tempo re-encoding and the final
//! frames-plus-narration mux.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::pan::FrameSequence;

/// Maximum stderr captured from a single invocation (1 MiB).
const MAX_STDERR_BYTES: u64 = 1024 * 1024;

/// Frames buffered between the cropping thread and the encoder pipe.
const FRAME_CHANNEL_CAPACITY: usize = 4;

/// Valid single-stage range of the `atempo` filter.
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("media file not found: {0}")]
    MediaNotFound(String),

    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid ffmpeg argument: {0}")]
    InvalidArgument(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub index: i32,
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub format_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Mux configuration
// ---------------------------------------------------------------------------

/// Encoder settings for the final video.
#[derive(Debug, Clone)]
pub struct MuxSpec {
    /// Video codec passed to `-c:v` (e.g. `libx264`).
    pub codec: String,
    /// Container name (e.g. `mp4`); mapped to an ffmpeg muxer.
    pub container: String,
    /// Encoder preset; omitted from the command line when empty.
    pub preset: String,
    /// Seconds of silence before the narration starts.
    pub audio_offset_secs: f64,
    /// Exact number of frames to write. Short sequences repeat their last frame.
    pub total_frames: usize,
    /// Optional `drawtext` filter composited over the whole clip.
    pub overlay_filter: Option<String>,
    /// Upper bound on the encoder's wall-clock time.
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check whether an `ffmpeg` binary can be spawned.
pub async fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run `ffprobe` on a media file and return the parsed JSON output.
pub async fn probe_media(path: &Path, timeout: Duration) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::MediaNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ])
    .arg(path)
    .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| FfmpegError::Timeout(timeout))?
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Probe a media file and return its duration in seconds.
pub async fn media_duration(path: &Path, timeout: Duration) -> Result<f64, FfmpegError> {
    let probe = probe_media(path, timeout).await?;
    Ok(parse_duration(&probe))
}

/// Re-encode `input` to PCM WAV at `output`, scaling its duration by `1 / factor`.
pub async fn change_tempo(
    input: &Path,
    output: &Path,
    factor: f64,
    timeout: Duration,
) -> Result<(), FfmpegError> {
    if !input.exists() {
        return Err(FfmpegError::MediaNotFound(
            input.to_string_lossy().to_string(),
        ));
    }
    let filter = atempo_filter(factor)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(input)
        .args(["-vn", "-filter:a", &filter, "-c:a", "pcm_s16le", "-f", "wav"])
        .arg(output);

    run(&mut cmd, timeout).await
}

/// Encode `frames` and the narration at `audio` into `output`.
///
/// Frames are streamed to ffmpeg as raw RGB over stdin from a blocking
/// thread. The audio track is delayed by `spec.audio_offset_secs` and the
/// output is cut to exactly `spec.total_frames` frames.
pub async fn mux_frames(
    frames: FrameSequence,
    audio: &Path,
    output: &Path,
    spec: &MuxSpec,
) -> Result<(), FfmpegError> {
    if frames.is_empty() {
        return Err(FfmpegError::InvalidArgument(
            "frame sequence is empty".to_string(),
        ));
    }
    if !audio.exists() {
        return Err(FfmpegError::MediaNotFound(
            audio.to_string_lossy().to_string(),
        ));
    }

    let fps = frames.fps();
    let output_args = mux_output_args(fps, spec)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(raw_input_args(frames.width(), frames.height(), fps))
        .arg("-i")
        .arg(audio)
        .args(output_args)
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let total_frames = spec.total_frames;
    let encode = async move {
        let mut child = cmd.spawn().map_err(FfmpegError::NotFound)?;
        let stderr_task = tokio::spawn(read_capped(child.stderr.take()));

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FfmpegError::InvalidArgument("ffmpeg stdin unavailable".into()))?;

        let (tx, mut rx) = tokio::sync::mpsc::channel::<Vec<u8>>(FRAME_CHANNEL_CAPACITY);
        let producer = tokio::task::spawn_blocking(move || {
            let last = frames.len() - 1;
            for i in 0..total_frames {
                let Some(frame) = frames.frame(i.min(last)) else {
                    break;
                };
                if tx.blocking_send(frame.into_raw()).is_err() {
                    break;
                }
            }
        });

        let mut write_error = None;
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = stdin.write_all(&bytes).await {
                write_error = Some(e);
                break;
            }
        }
        drop(rx);
        drop(stdin);
        let _ = producer.await;

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).to_string(),
            });
        }
        match write_error {
            Some(e) => Err(FfmpegError::IoError(e)),
            None => Ok(()),
        }
    };

    tokio::time::timeout(spec.timeout, encode)
        .await
        .map_err(|_| FfmpegError::Timeout(spec.timeout))?
}

// ---------------------------------------------------------------------------
// Command construction
// ---------------------------------------------------------------------------

/// Build the `atempo` filter chain for `factor`.
///
/// Factors outside a single stage's range are split into several stages
/// whose product equals `factor`.
pub fn atempo_filter(factor: f64) -> Result<String, FfmpegError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(FfmpegError::InvalidArgument(format!(
            "tempo factor must be a positive finite number, got {factor}"
        )));
    }

    let mut stages = Vec::new();
    let mut remaining = factor;
    while remaining > ATEMPO_MAX {
        stages.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    stages.push(remaining);

    Ok(stages
        .iter()
        .map(|s| format!("atempo={s}"))
        .collect::<Vec<_>>()
        .join(","))
}

/// Map a container name to the ffmpeg muxer used with `-f`.
pub fn container_format(container: &str) -> Result<&'static str, FfmpegError> {
    match container.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => Ok("mp4"),
        "mov" => Ok("mov"),
        "mkv" => Ok("matroska"),
        "webm" => Ok("webm"),
        other => Err(FfmpegError::InvalidArgument(format!(
            "unsupported container '{other}'"
        ))),
    }
}

/// Escape a value for use inside an ffmpeg filter option.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | ';' | '[' | ']' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `drawtext` filter anchoring the text of `textfile` to the lower-left corner.
pub fn drawtext_filter(
    textfile: &Path,
    font_file: Option<&Path>,
    font_size: u32,
    color: &str,
    margin: u32,
) -> String {
    let mut filter = format!(
        "drawtext=textfile={}:fontsize={font_size}:fontcolor={}:x={margin}:y=h-th-{margin}",
        escape_filter_value(&textfile.to_string_lossy()),
        escape_filter_value(color),
    );
    if let Some(font) = font_file {
        filter.push_str(&format!(
            ":fontfile={}",
            escape_filter_value(&font.to_string_lossy())
        ));
    }
    filter
}

/// Input options describing the raw RGB frames piped on stdin.
fn raw_input_args(width: u32, height: u32, fps: u32) -> Vec<String> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{width}x{height}"),
        "-r".into(),
        fps.to_string(),
        "-i".into(),
        "pipe:0".into(),
    ]
}

/// Output options: delayed narration, optional overlay, codec and length.
///
/// Expects the frames as input 0 and the narration as input 1.
fn mux_output_args(fps: u32, spec: &MuxSpec) -> Result<Vec<String>, FfmpegError> {
    if fps == 0 {
        return Err(FfmpegError::InvalidArgument("fps must be positive".into()));
    }
    let format = container_format(&spec.container)?;
    let delay_ms = (spec.audio_offset_secs.max(0.0) * 1000.0).round() as u64;
    let duration = spec.total_frames as f64 / fps as f64;

    let mut graph = format!("[1:a]adelay=delays={delay_ms}:all=1[aud]");
    let video_label = match &spec.overlay_filter {
        Some(overlay) => {
            graph.push_str(&format!(";[0:v]{overlay}[vid]"));
            "[vid]"
        }
        None => "0:v",
    };

    let mut args: Vec<String> = vec![
        "-filter_complex".into(),
        graph,
        "-map".into(),
        video_label.into(),
        "-map".into(),
        "[aud]".into(),
        "-c:v".into(),
        spec.codec.clone(),
    ];
    if !spec.preset.is_empty() {
        args.extend(["-preset".into(), spec.preset.clone()]);
    }
    args.extend([
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        fps.to_string(),
        "-c:a".into(),
        "aac".into(),
        "-t".into(),
        format!("{duration:.3}"),
        "-f".into(),
        format.into(),
    ]);
    Ok(args)
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse the media duration in seconds from ffprobe output.
///
/// Prefers the format-level duration and falls back to the first stream
/// that reports one.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    if let Some(secs) = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
    {
        return secs;
    }
    probe
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref())
        .find_map(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Whether the probe found at least one audio stream.
pub fn has_audio_stream(probe: &FfprobeOutput) -> bool {
    probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"))
}

// ---------------------------------------------------------------------------
// Process helpers
// ---------------------------------------------------------------------------

/// Run a prepared command to completion, mapping failures to [`FfmpegError`].
async fn run(cmd: &mut Command, timeout: Duration) -> Result<(), FfmpegError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| FfmpegError::Timeout(timeout))?
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_STDERR_BYTES`].
async fn read_capped<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(MAX_STDERR_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
