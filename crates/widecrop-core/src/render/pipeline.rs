//! Preview and export compositions.
//!
//! Both pipelines build the same canvas-style affine chain and differ only in
//! where the frame center sits and how frame pixels map to surface pixels:
//!
//! ```text
//! preview: scale(dpr) · translate(center) · translate(x, y) · rotate · scale(s)
//! export:  translate(center) · translate(x·sx, y·sy) · scale(sx, sy) · rotate · scale(s)
//! ```
//!
//! The order is fixed; the components do not commute.

use glam::{DAffine2, DMat2, DVec2};

use super::{InterpolationFilter, Surface};
use crate::decode::DecodedImage;
use crate::geometry::{CropArea, Rotation, Transform};

/// Size of the preview drawing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Container width in CSS pixels.
    pub css_width: f64,
    /// Container height in CSS pixels.
    pub css_height: f64,
    /// Device pixels per CSS pixel; non-positive values are treated as 1.
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
        }
    }

    fn dpr(&self) -> f64 {
        if self.device_pixel_ratio > 0.0 && self.device_pixel_ratio.is_finite() {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Backing-store size in device pixels (truncated, as canvas does).
    pub fn device_size(&self) -> (u32, u32) {
        let to_px = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v.floor().min(f64::from(u32::MAX)) as u32
            } else {
                0
            }
        };
        (
            to_px(self.css_width * self.dpr()),
            to_px(self.css_height * self.dpr()),
        )
    }
}

/// Quarter-turn rotation as an affine map, built from exact sin/cos.
pub fn rotation_affine(rotation: Rotation) -> DAffine2 {
    let (sin, cos) = rotation.sin_cos();
    DAffine2::from_mat2(DMat2::from_cols(
        DVec2::new(cos, sin),
        DVec2::new(-sin, cos),
    ))
}

/// Image-local to device-pixel mapping for the live preview.
pub fn preview_affine(transform: &Transform, viewport: &Viewport) -> DAffine2 {
    DAffine2::from_scale(DVec2::splat(viewport.dpr()))
        * DAffine2::from_translation(DVec2::new(
            viewport.css_width / 2.0,
            viewport.css_height / 2.0,
        ))
        * DAffine2::from_translation(DVec2::new(transform.x, transform.y))
        * rotation_affine(transform.rotation)
        * DAffine2::from_scale(DVec2::splat(transform.scale))
}

/// Image-local to output-pixel mapping for export.
///
/// Frame pixels map to output pixels by `(sx, sy) = output / crop`. That map
/// is applied in output space, after the rotation, so the framing seen on
/// screen is reproduced exactly at every quarter turn. Returns `None` for an
/// unmeasured crop frame.
pub fn export_affine(
    transform: &Transform,
    crop: CropArea,
    output_width: u32,
    output_height: u32,
) -> Option<DAffine2> {
    if crop.is_empty() {
        return None;
    }
    let (out_w, out_h) = (f64::from(output_width), f64::from(output_height));
    let sx = out_w / crop.width;
    let sy = out_h / crop.height;

    Some(
        DAffine2::from_translation(DVec2::new(out_w / 2.0, out_h / 2.0))
            * DAffine2::from_translation(DVec2::new(transform.x * sx, transform.y * sy))
            * DAffine2::from_scale(DVec2::new(sx, sy))
            * rotation_affine(transform.rotation)
            * DAffine2::from_scale(DVec2::splat(transform.scale)),
    )
}

/// Draw the preview: background fill, then the transformed image.
///
/// Returns `None` when there is nothing to draw on (empty image or a
/// collapsed viewport).
pub fn render_preview(
    image: &DecodedImage,
    transform: &Transform,
    viewport: &Viewport,
    background: [u8; 4],
    filter: InterpolationFilter,
) -> Option<Surface> {
    let (width, height) = viewport.device_size();
    if image.is_empty() || width == 0 || height == 0 {
        return None;
    }

    let mut surface = Surface::filled(width, height, background);
    surface.draw_image(image, preview_affine(transform, viewport), filter);
    Some(surface)
}

/// Draw the export onto a transparent `output_width` x `output_height` surface.
pub fn render_export(
    image: &DecodedImage,
    transform: &Transform,
    crop: CropArea,
    output_width: u32,
    output_height: u32,
    filter: InterpolationFilter,
) -> Option<Surface> {
    if image.is_empty() || output_width == 0 || output_height == 0 {
        return None;
    }
    let affine = export_affine(transform, crop, output_width, output_height)?;

    let mut surface = Surface::new(output_width, output_height);
    surface.draw_image(image, affine, filter);
    Some(surface)
}
