//! Widecrop WASM - WebAssembly bindings for Widecrop
//!
//! This crate exposes widecrop-core to the page and to the service worker.
//!
//! # Module Structure
//!
//! - `app` - `JsApp`: upload, editing gestures, preview rendering and export
//! - `offline` - `JsCachePolicy`: service-worker install, activate and fetch decisions
//! - `types` - WASM-compatible wrapper types for frames and exports
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsApp } from '@widecrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const app = new JsApp({ wheel_sensitivity: 0.002 });
//! const frame = app.render_preview(container.clientWidth, container.clientHeight, devicePixelRatio);
//! if (frame) {
//!   const data = new ImageData(new Uint8ClampedArray(frame.pixels()), frame.width, frame.height);
//!   ctx.putImageData(data, 0, 0);
//! }
//! ```

use wasm_bindgen::prelude::*;

mod app;
mod offline;
mod types;

pub use app::JsApp;
pub use offline::{JsCachePolicy, JsFetchDecision};
pub use types::{JsExport, JsSurface};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (e.g. in tests) finds the logger already set
    let _ = console_log::init_with_level(log::Level::Debug);
    log::info!("widecrop {} ready", version());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
