//! Fixed-resolution export of the framed region.
//!
//! Whatever size the on-screen frame has, the export is always
//! [`OUTPUT_WIDTH`] x [`OUTPUT_HEIGHT`]. The on-screen transform is replayed
//! at that resolution and the result is encoded as PNG.

use thiserror::Error;

use crate::config::{OUTPUT_HEIGHT, OUTPUT_WIDTH};
use crate::decode::DecodedImage;
use crate::encode::{encode_png, EncodeError};
use crate::geometry::{CropArea, Transform};
use crate::render::{render_export, InterpolationFilter};

/// Prefix of every exported file name.
pub const EXPORT_FILE_PREFIX: &str = "cropped_21-9_";

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The crop frame was never measured, so there is nothing to map from.
    #[error("Crop frame is empty ({width}x{height})")]
    EmptyCropArea { width: f64, height: f64 },

    /// The source image has no pixels.
    #[error("Source image is empty")]
    EmptyImage,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A finished export, ready to hand to a download.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded bytes.
    pub png: Vec<u8>,
}

/// Download name for an export made at `unix_millis`.
pub fn export_file_name(unix_millis: u64) -> String {
    format!("{EXPORT_FILE_PREFIX}{unix_millis}.png")
}

/// Render `transform` at the fixed output size and encode it as PNG.
pub fn export_png(
    image: &DecodedImage,
    transform: &Transform,
    crop: CropArea,
    filter: InterpolationFilter,
) -> Result<ExportedImage, ExportError> {
    if crop.is_empty() {
        return Err(ExportError::EmptyCropArea {
            width: crop.width,
            height: crop.height,
        });
    }

    let surface = render_export(image, transform, crop, OUTPUT_WIDTH, OUTPUT_HEIGHT, filter)
        .ok_or(ExportError::EmptyImage)?;

    log::debug!(
        "exporting {}x{} from {:.1}x{:.1} frame (scale {:.4}, {}°)",
        surface.width,
        surface.height,
        crop.width,
        crop.height,
        transform.scale,
        transform.rotation.degrees()
    );

    let png = encode_png(&surface.pixels, surface.width, surface.height)?;
    Ok(ExportedImage {
        width: surface.width,
        height: surface.height,
        png,
    })
}
