//! Crop rectangle models.
//!
//! A crop travels through the pipeline in two forms: the fractional
//! rect the UI edits, and the pixel rect handed to the encoder. The
//! pixel form is derived on demand and never cached.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A fractional rectangle (0.0 to 1.0) representing a relative region
/// of the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropRect {
    /// X coordinate of the top-left corner (0.0 = left, 1.0 = right)
    pub x: f64,
    /// Y coordinate of the top-left corner (0.0 = top, 1.0 = bottom)
    pub y: f64,
    /// Width of the rectangle (0.0 to 1.0)
    pub w: f64,
    /// Height of the rectangle (0.0 to 1.0)
    pub h: f64,
}

/// A crop rectangle in source-frame pixel units.
///
/// Width and height are always even and at least 2 (chroma-subsampled
/// codecs reject odd dimensions), and the rect fits inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

fn clamp01(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

impl CropRect {
    /// Create a new fractional crop rectangle.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The identity crop covering the whole frame.
    pub fn full_frame() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Clamp the rect into the unit square.
    ///
    /// Width and height are clamped before position, so a single pass
    /// suffices after both drag-move and resize edits: once `w` fits,
    /// `x = 1 - w` is always a valid position. Returns a new value;
    /// the input is never mutated.
    pub fn normalize(&self) -> Self {
        let w = clamp01(self.w);
        let h = clamp01(self.h);
        let mut x = clamp01(self.x);
        let mut y = clamp01(self.y);

        if x + w > 1.0 {
            x = 1.0 - w;
        }
        if y + h > 1.0 {
            y = 1.0 - h;
        }

        Self { x, y, w, h }
    }

    /// Convert to pixel units for a source frame of the given size.
    ///
    /// Each coordinate is rounded; odd dimensions are decremented to
    /// the next even value and floored at 2. A degenerate (zero-size)
    /// rect resolves to the 2px floor rather than an error.
    pub fn to_pixels(&self, frame_w: u32, frame_h: u32) -> PixelRect {
        let mut w = (self.w * frame_w as f64).round() as i64;
        let mut h = (self.h * frame_h as f64).round() as i64;
        let mut x = (self.x * frame_w as f64).round() as i64;
        let mut y = (self.y * frame_h as f64).round() as i64;

        if w % 2 != 0 {
            w -= 1;
        }
        if h % 2 != 0 {
            h -= 1;
        }
        w = w.max(2);
        h = h.max(2);

        // Rounding can push the far edge one pixel past the frame.
        x = x.min(frame_w as i64 - w).max(0);
        y = y.min(frame_h as i64 - h).max(0);

        PixelRect {
            x: x as u32,
            y: y as u32,
            w: w as u32,
            h: h as u32,
        }
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::full_frame()
    }
}

impl PixelRect {
    /// Render as an FFmpeg crop filter: `crop=w:h:x:y`.
    pub fn to_crop_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.w, self.h, self.x, self.y)
    }
}
