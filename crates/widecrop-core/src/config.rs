//! Editor tuning knobs.
//!
//! The crop ratio and output resolution are fixed constants; everything that
//! only affects how input feels or how pixels are sampled lives here so hosts
//! can override it (the WASM layer accepts it as a plain JS object).

use serde::{Deserialize, Serialize};

use crate::render::InterpolationFilter;

/// Width of the exported image in pixels.
pub const OUTPUT_WIDTH: u32 = 1920;

/// Height of the exported image in pixels.
pub const OUTPUT_HEIGHT: u32 = 720;

/// Settings for an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Scale change per pixel of pinch distance change.
    pub pinch_sensitivity: f64,
    /// Scale change per unit of vertical wheel delta (sign inverted).
    pub wheel_sensitivity: f64,
    /// Share of the container width the crop frame may take.
    pub frame_width_fraction: f64,
    /// Share of the container height the crop frame may take.
    pub frame_height_fraction: f64,
    /// RGBA fill behind the image in the preview.
    pub background: [u8; 4],
    /// Sampling used for the live preview.
    pub preview_filter: InterpolationFilter,
    /// Sampling used for the exported PNG.
    pub export_filter: InterpolationFilter,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            pinch_sensitivity: 0.01,
            wheel_sensitivity: 0.001,
            frame_width_fraction: 0.9,
            frame_height_fraction: 0.8,
            background: [0, 0, 0, 255],
            preview_filter: InterpolationFilter::Bilinear,
            export_filter: InterpolationFilter::Lanczos3,
        }
    }
}
