//! Widecrop Core - 21:9 photo cropping library
//!
//! This crate provides everything behind the Widecrop editor that does not
//! touch the DOM: crop-frame geometry and its coverage constraint, the editor
//! session state machine, software rendering of the preview and the fixed
//! 1920x720 export, PNG encoding, upload filtering, the app lifecycle and the
//! offline cache policy.
//!
//! # Module Structure
//!
//! - `geometry` - Transform, crop frame, covering scale, constraint
//! - `editor` - Per-session state and input event handling
//! - `render` - RGBA surface and the preview/export compositions
//! - `decode` / `encode` - Image bytes in, PNG bytes out
//! - `export` - Fixed-size export and download naming
//! - `upload` - Which dropped/picked file to open
//! - `app` - Upload/edit lifecycle with async completion guards
//! - `offline` - Service-worker cache strategy

pub mod app;
pub mod config;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod offline;
pub mod render;
pub mod upload;

pub use app::{App, ImageResource, Screen};
pub use config::{EditorConfig, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use decode::{decode_image, DecodedImage};
pub use editor::{Contacts, EditorEvent, EditorSession, Point};
pub use export::{export_file_name, ExportedImage};
pub use geometry::{constrain, CropArea, ImageSize, Rotation, Transform, CROP_RATIO};
pub use render::{Surface, Viewport};
