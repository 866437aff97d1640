//! Image encoding for export.
//!
//! The cropper always exports lossless RGBA PNG.

mod png;

pub use png::{encode_png, EncodeError};
