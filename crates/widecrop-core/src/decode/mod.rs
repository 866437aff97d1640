//! Image decoding for uploaded files.
//!
//! The editor works on one immutable RGBA bitmap per session. This module
//! turns the uploaded bytes (JPEG, PNG, GIF, WebP, BMP) into that bitmap,
//! upright according to EXIF orientation.

mod bitmap;
mod types;

pub use bitmap::{decode_image, read_orientation};
pub use types::{DecodeError, DecodedImage, Orientation};
