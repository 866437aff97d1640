//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core Widecrop
//! types, handling the conversion between Rust and JavaScript data representations.

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use widecrop_core::editor::Point;
use widecrop_core::render::Surface;

/// A rendered RGBA frame for JavaScript.
///
/// `pixels()` is laid out exactly like `ImageData.data`, so the host can do
/// `ctx.putImageData(new ImageData(new Uint8ClampedArray(s.pixels()), s.width, s.height), 0, 0)`.
#[wasm_bindgen]
pub struct JsSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsSurface {
    /// Surface width in device pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in device pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl From<Surface> for JsSurface {
    fn from(surface: Surface) -> Self {
        Self {
            width: surface.width,
            height: surface.height,
            pixels: surface.pixels,
        }
    }
}

/// Finished export handed back to JavaScript for download.
#[wasm_bindgen]
pub struct JsExport {
    generation: f64,
    file_name: String,
    png: Vec<u8>,
}

#[wasm_bindgen]
impl JsExport {
    /// Pass back to `finish_export` once the download was triggered
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.generation
    }

    /// Suggested download name, `cropped_21-9_<millis>.png`
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    /// PNG bytes as Uint8Array
    pub fn png(&self) -> Vec<u8> {
        self.png.clone()
    }
}

impl JsExport {
    pub(crate) fn new(generation: u64, file_name: String, png: Vec<u8>) -> Self {
        Self {
            generation: generation as f64,
            file_name,
            png,
        }
    }
}

/// Pair up a flat `[x0, y0, x1, y1, ...]` coordinate list.
///
/// A trailing odd value is ignored.
pub(crate) fn points_from_flat(coords: &[f64]) -> Vec<Point> {
    coords
        .chunks_exact(2)
        .map(|c| Point::new(c[0], c[1]))
        .collect()
}

/// Read an optional config object; `undefined`/`null` give the defaults.
pub(crate) fn config_from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
