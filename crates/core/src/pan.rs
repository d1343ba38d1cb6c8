//! Horizontal pan over a still image.
//!
//! The source is scaled to the output height, then a window of the output
//! size slides right across the middle third of the available range, one
//! step per video frame. Frames are materialized on demand from the resized
//! canvas so a long clip never holds every frame in memory.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Default output frame width (portrait short-form video).
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1080;

/// Default output frame height.
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 1920;

/// Default frame rate of generated clips.
pub const DEFAULT_FPS: u32 = 24;

// ---------------------------------------------------------------------------
// Speed
// ---------------------------------------------------------------------------

/// How fast the window travels, as a fraction of the maximum shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanSpeed {
    #[default]
    Slow,
    Medium,
    Fast,
}

impl PanSpeed {
    /// Multiplier applied to the maximum per-frame shift.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Slow => 0.5,
            Self::Medium => 0.75,
            Self::Fast => 1.0,
        }
    }

    /// Parse a speed name. Unknown names fall back to [`PanSpeed::Slow`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "medium" => Self::Medium,
            "fast" => Self::Fast,
            _ => Self::Slow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

/// Output geometry, frame rate and speed of a pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanSettings {
    pub output_width: u32,
    pub output_height: u32,
    pub fps: u32,
    pub speed: PanSpeed,
}

impl Default for PanSettings {
    fn default() -> Self {
        Self {
            output_width: DEFAULT_OUTPUT_WIDTH,
            output_height: DEFAULT_OUTPUT_HEIGHT,
            fps: DEFAULT_FPS,
            speed: PanSpeed::Slow,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame sequence
// ---------------------------------------------------------------------------

/// Ordered, equally sized frames cut from one resized canvas.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    canvas: RgbImage,
    origins: Vec<u32>,
    width: u32,
    height: u32,
    fps: u32,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Width of the resized canvas the frames are cut from.
    pub fn canvas_width(&self) -> u32 {
        self.canvas.width()
    }

    /// X offset of every crop window, in frame order.
    pub fn origins(&self) -> &[u32] {
        &self.origins
    }

    /// Playback length of the sequence at its frame rate.
    pub fn duration_secs(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.origins.len() as f64 / self.fps as f64
    }

    /// Cut frame `index` out of the canvas.
    pub fn frame(&self, index: usize) -> Option<RgbImage> {
        let x = *self.origins.get(index)?;
        Some(imageops::crop_imm(&self.canvas, x, 0, self.width, self.height).to_image())
    }

    /// Iterate over all frames in order.
    pub fn iter(&self) -> impl Iterator<Item = RgbImage> + '_ {
        (0..self.len()).filter_map(move |i| self.frame(i))
    }
}

// ---------------------------------------------------------------------------
// Pan computation
// ---------------------------------------------------------------------------

/// Number of frames needed to cover `duration_secs` at `fps`.
pub fn frame_count(duration_secs: f64, fps: u32) -> usize {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs * fps as f64).floor() as usize
}

/// Pixels the window advances per frame. Never less than one.
pub fn pixel_shift(resized_width: u32, output_width: u32, frames: usize, speed: PanSpeed) -> u32 {
    let pannable = resized_width.saturating_sub(output_width) as f64 / 3.0;
    let max_shift = if pannable > 0.0 && frames > 0 {
        pannable / frames as f64
    } else {
        0.0
    };
    ((max_shift * speed.multiplier()).floor() as u32).max(1)
}

/// Crop origins for up to `frames` windows, starting a third of the way in.
///
/// Stops early once the next window would run past the right edge.
pub fn crop_origins(resized_width: u32, output_width: u32, frames: usize, shift: u32) -> Vec<u32> {
    let mut origins = Vec::with_capacity(frames);
    let mut x = resized_width.saturating_sub(output_width) / 3;
    for _ in 0..frames {
        if x + output_width > resized_width {
            break;
        }
        origins.push(x);
        x += shift;
    }
    origins
}

/// Widest canvas, in multiples of the output width.
pub const MAX_CANVAS_WIDTH_FACTOR: u32 = 8;

/// Scale `image` to the output height, keeping its aspect ratio.
///
/// Images narrower than the output after scaling are centred on a black
/// canvas of output width so at least one window fits. Images that would
/// scale wider than [`MAX_CANVAS_WIDTH_FACTOR`] output widths are cropped
/// around their centre first.
fn fit_to_height(image: &RgbImage, output_width: u32, output_height: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    let max_w = output_width.saturating_mul(MAX_CANVAS_WIDTH_FACTOR);
    let natural_w = (src_w as u64 * output_height as u64 / src_h.max(1) as u64).max(1);

    let (source, scaled_w) = if natural_w > max_w as u64 {
        let keep = (max_w as u64 * src_h as u64)
            .div_ceil(output_height.max(1) as u64)
            .clamp(1, src_w as u64) as u32;
        let left = (src_w - keep) / 2;
        let cropped = imageops::crop_imm(image, left, 0, keep, src_h).to_image();
        (Cow::Owned(cropped), max_w)
    } else {
        (Cow::Borrowed(image), natural_w as u32)
    };
    let resized = imageops::resize(&*source, scaled_w, output_height, FilterType::Lanczos3);

    if scaled_w >= output_width {
        return resized;
    }
    let mut canvas = RgbImage::new(output_width, output_height);
    let left = (output_width - scaled_w) / 2;
    imageops::overlay(&mut canvas, &resized, left as i64, 0);
    canvas
}

/// Build the frame sequence that pans across `image` for `target_duration_secs`.
pub fn pan(image: &RgbImage, target_duration_secs: f64, settings: &PanSettings) -> FrameSequence {
    let canvas = fit_to_height(image, settings.output_width, settings.output_height);
    let frames = frame_count(target_duration_secs, settings.fps);
    let shift = pixel_shift(canvas.width(), settings.output_width, frames, settings.speed);
    let origins = crop_origins(canvas.width(), settings.output_width, frames, shift);

    tracing::debug!(
        canvas_width = canvas.width(),
        requested_frames = frames,
        produced_frames = origins.len(),
        shift,
        speed = settings.speed.as_str(),
        "Computed pan",
    );

    FrameSequence {
        canvas,
        origins,
        width: settings.output_width,
        height: settings.output_height,
        fps: settings.fps,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 0, 0]))
    }

    // -- speed ----------------------------------------------------------------

    #[test]
    fn speed_names_parse_with_slow_fallback() {
        assert_eq!(PanSpeed::from_name("fast"), PanSpeed::Fast);
        assert_eq!(PanSpeed::from_name("Medium"), PanSpeed::Medium);
        assert_eq!(PanSpeed::from_name("warp"), PanSpeed::Slow);
        assert_eq!(PanSpeed::from_name(""), PanSpeed::Slow);
    }

    // -- arithmetic -----------------------------------------------------------

    #[test]
    fn frame_count_floors() {
        assert_eq!(frame_count(6.0, 24), 144);
        assert_eq!(frame_count(7.69, 24), 184);
        assert_eq!(frame_count(0.0, 24), 0);
        assert_eq!(frame_count(f64::NAN, 24), 0);
    }

    #[test]
    fn pixel_shift_scales_with_speed() {
        // 3413 px canvas, 1080 px window: pannable ≈ 777.67 over 144 frames.
        assert_eq!(pixel_shift(3413, 1080, 144, PanSpeed::Slow), 2);
        assert_eq!(pixel_shift(3413, 1080, 144, PanSpeed::Medium), 4);
        assert_eq!(pixel_shift(3413, 1080, 144, PanSpeed::Fast), 5);
    }

    #[test]
    fn pixel_shift_is_at_least_one() {
        assert_eq!(pixel_shift(1080, 1080, 144, PanSpeed::Fast), 1);
        assert_eq!(pixel_shift(900, 1080, 144, PanSpeed::Slow), 1);
        assert_eq!(pixel_shift(3413, 1080, 0, PanSpeed::Slow), 1);
    }

    #[test]
    fn crop_origins_start_a_third_in() {
        let origins = crop_origins(1300, 1000, 4, 10);
        assert_eq!(origins, vec![100, 110, 120, 130]);
    }

    #[test]
    fn crop_origins_stop_at_right_edge() {
        // Start 10, window 30, canvas 60: origins 10, 20, 30 fit; 40 would not.
        let origins = crop_origins(60, 30, 10, 10);
        assert_eq!(origins, vec![10, 20, 30]);
    }

    #[test]
    fn crop_origins_exact_width_yields_single_frame() {
        assert_eq!(crop_origins(1080, 1080, 144, 1), vec![0]);
    }

    // -- pan ------------------------------------------------------------------

    #[test]
    fn pan_uhd_source_slow() {
        let source = RgbImage::new(3840, 2160);
        let seq = pan(&source, 6.0, &PanSettings::default());

        assert!(seq.len() <= 144);
        assert_eq!(seq.len(), 144);
        assert_eq!(seq.canvas_width(), 3413);
        assert!(seq.origins().windows(2).all(|w| w[0] <= w[1]));
        assert!(seq
            .origins()
            .iter()
            .all(|&x| x + DEFAULT_OUTPUT_WIDTH <= seq.canvas_width()));

        for index in [0, seq.len() - 1] {
            let frame = seq.frame(index).unwrap();
            assert_eq!(frame.dimensions(), (1080, 1920));
        }
        assert!((seq.duration_secs() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn frames_are_cut_at_their_origin() {
        let settings = PanSettings {
            output_width: 40,
            output_height: 20,
            fps: 10,
            speed: PanSpeed::Fast,
        };
        let seq = pan(&gradient(200, 20), 2.0, &settings);

        assert_eq!(seq.len(), 20);
        for (frame, &x) in seq.iter().zip(seq.origins()) {
            assert_eq!(frame.dimensions(), (40, 20));
            assert_eq!(frame.get_pixel(0, 0)[0], (x % 256) as u8);
        }
    }

    #[test]
    fn narrow_source_is_letterboxed() {
        let settings = PanSettings {
            output_width: 40,
            output_height: 20,
            fps: 10,
            speed: PanSpeed::Slow,
        };
        // Scales to 10x20, then centred on a 40x20 canvas.
        let seq = pan(&RgbImage::from_pixel(5, 10, Rgb([255, 255, 255])), 3.0, &settings);

        assert_eq!(seq.canvas_width(), 40);
        assert_eq!(seq.len(), 1);
        let frame = seq.frame(0).unwrap();
        assert_eq!(frame.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(20, 10), &Rgb([255, 255, 255]));
    }

    #[test]
    fn banner_source_is_cropped_to_bounded_canvas() {
        let settings = PanSettings {
            output_width: 40,
            output_height: 20,
            fps: 10,
            speed: PanSpeed::Slow,
        };
        // 600x1 would scale to 12000x20; capped at eight output widths.
        let seq = pan(&gradient(600, 1), 2.0, &settings);

        assert_eq!(seq.canvas_width(), 40 * MAX_CANVAS_WIDTH_FACTOR);
        assert!(!seq.is_empty());
        assert_eq!(seq.frame(0).unwrap().dimensions(), (40, 20));
    }

    #[test]
    fn frame_out_of_range_is_none() {
        let settings = PanSettings {
            output_width: 10,
            output_height: 10,
            fps: 1,
            speed: PanSpeed::Slow,
        };
        let seq = pan(&RgbImage::new(30, 10), 2.0, &settings);
        assert!(seq.frame(seq.len()).is_none());
    }
}
