//! WASM bindings for the cropper app.
//!
//! `JsApp` is the single object the page talks to. The page owns the DOM:
//! it reads files, creates the object URL, forwards pointer/touch/wheel
//! events, blits rendered frames into the canvas and triggers the download.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const app = new JsApp(undefined);
//!
//! input.onchange = async () => {
//!   const files = Array.from(input.files ?? []);
//!   if (!JsApp.select_file(files.map(f => f.name), files.map(f => f.type))) return;
//!   const file = files[0];
//!   const generation = app.begin_load(URL.createObjectURL(file));
//!   const bytes = new Uint8Array(await file.arrayBuffer());
//!   app.finish_load(generation, bytes, container.clientWidth, container.clientHeight);
//!   draw();
//! };
//!
//! saveButton.onclick = () => {
//!   const exported = app.begin_export();
//!   if (!exported) return;
//!   download(new Blob([exported.png()], { type: 'image/png' }), exported.file_name);
//!   app.finish_export(exported.generation);
//! };
//! ```

use wasm_bindgen::prelude::*;
use widecrop_core::app::{ExportTicket, LoadTicket};
use widecrop_core::decode::{decode_image, DecodeError};
use widecrop_core::editor::{Contacts, EditorEvent, EditorSession};
use widecrop_core::export::{export_file_name, ExportError};
use widecrop_core::render::Viewport;
use widecrop_core::upload::{select_image, FileInfo};
use widecrop_core::{App, EditorConfig, ImageResource};

use crate::types::{config_from_js, now_millis, points_from_flat, JsExport, JsSurface};

/// An object URL created by the page for the picked file.
pub struct ObjectUrl(String);

impl ImageResource for ObjectUrl {
    fn release(self) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Err(e) = web_sys::Url::revoke_object_url(&self.0) {
                log::warn!("failed to revoke {}: {:?}", self.0, e);
            }
        }
        log::debug!("released {}", self.0);
    }
}

/// The cropper application state for JavaScript.
#[wasm_bindgen]
pub struct JsApp {
    inner: App<ObjectUrl>,
}

#[wasm_bindgen]
impl JsApp {
    /// Create the app. `config` is an optional partial `EditorConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsApp, JsValue> {
        let config: EditorConfig = config_from_js(config)?;
        Ok(Self::with_config(config))
    }

    /// Whether a picked or dropped selection should be opened.
    ///
    /// When true the page opens `files[0]`; the rest of the selection is
    /// never looked at.
    pub fn select_file(names: Vec<String>, mime_types: Vec<String>) -> bool {
        let files: Vec<FileInfo> = names
            .into_iter()
            .zip(mime_types)
            .map(|(name, mime_type)| FileInfo::new(name, mime_type))
            .collect();
        select_image(&files).is_some()
    }

    /// True while the editor (rather than the upload screen) is shown.
    #[wasm_bindgen(getter)]
    pub fn editing(&self) -> bool {
        self.inner.editor().is_some()
    }

    /// Start loading a file; returns the generation to pass to `finish_load`.
    pub fn begin_load(&mut self, object_url: String) -> f64 {
        self.inner.begin_load(ObjectUrl(object_url)).generation() as f64
    }

    /// Decode the file bytes and open the editor.
    ///
    /// Resolves to `false` when a newer load or a cancel made this one stale.
    pub fn finish_load(
        &mut self,
        generation: f64,
        bytes: &[u8],
        container_width: f64,
        container_height: f64,
    ) -> Result<bool, JsValue> {
        self.load_bytes(generation as u64, bytes, container_width, container_height)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Forward a mousedown/touchstart; `coords` is `[x0, y0, x1, y1, ...]`.
    pub fn pointer_down(&mut self, coords: &[f64]) -> bool {
        match Contacts::from_points(&points_from_flat(coords)) {
            Some(contacts) => self.dispatch(EditorEvent::PointerDown(contacts)),
            None => false,
        }
    }

    /// Forward a mousemove/touchmove. Returns true if a redraw is needed.
    pub fn pointer_move(&mut self, coords: &[f64]) -> bool {
        match Contacts::from_points(&points_from_flat(coords)) {
            Some(contacts) => self.dispatch(EditorEvent::PointerMove(contacts)),
            None => false,
        }
    }

    /// Forward a mouseup/touchend.
    pub fn pointer_up(&mut self) {
        self.dispatch(EditorEvent::PointerUp);
    }

    /// Forward a wheel event's `deltaY`.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.dispatch(EditorEvent::Wheel { delta_y })
    }

    /// Rotate a quarter turn clockwise, resetting pan and zoom.
    pub fn rotate(&mut self) -> bool {
        self.dispatch(EditorEvent::Rotate)
    }

    /// Crop frame width in CSS pixels (0 when not editing)
    #[wasm_bindgen(getter)]
    pub fn crop_width(&self) -> f64 {
        self.editor().map_or(0.0, |e| e.crop_area().width)
    }

    /// Crop frame height in CSS pixels (0 when not editing)
    #[wasm_bindgen(getter)]
    pub fn crop_height(&self) -> f64 {
        self.editor().map_or(0.0, |e| e.crop_area().height)
    }

    #[wasm_bindgen(getter)]
    pub fn offset_x(&self) -> f64 {
        self.editor().map_or(0.0, |e| e.transform().x)
    }

    #[wasm_bindgen(getter)]
    pub fn offset_y(&self) -> f64 {
        self.editor().map_or(0.0, |e| e.transform().y)
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.editor().map_or(1.0, |e| e.transform().scale)
    }

    /// Rotation in degrees (0, 90, 180 or 270)
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> i32 {
        self.editor().map_or(0, |e| e.transform().rotation.degrees())
    }

    /// Render the preview for a container of the given CSS size.
    ///
    /// Returns `undefined` when there is nothing to draw.
    pub fn render_preview(
        &self,
        css_width: f64,
        css_height: f64,
        device_pixel_ratio: f64,
    ) -> Option<JsSurface> {
        let viewport = Viewport::new(css_width, css_height, device_pixel_ratio);
        self.editor()?.render_preview(&viewport).map(JsSurface::from)
    }

    /// Render and encode the 1920x720 PNG.
    ///
    /// Returns `undefined` if not editing or an export is already in flight.
    /// Call `finish_export` after the download has been triggered.
    pub fn begin_export(&mut self) -> Result<Option<JsExport>, JsValue> {
        self.export_now()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Close the editor after a download. Returns false for a stale export.
    pub fn finish_export(&mut self, generation: f64) -> bool {
        self.inner
            .finish_export(ExportTicket::from_generation(generation as u64))
    }

    /// Leave the editor without exporting.
    pub fn cancel(&mut self) {
        self.inner.complete();
    }
}

impl JsApp {
    pub(crate) fn with_config(config: EditorConfig) -> Self {
        Self {
            inner: App::new(config),
        }
    }

    fn editor(&self) -> Option<&EditorSession> {
        self.inner.editor()
    }

    fn dispatch(&mut self, event: EditorEvent) -> bool {
        self.inner
            .editor_mut()
            .map_or(false, |editor| editor.handle(event))
    }

    fn load_bytes(
        &mut self,
        generation: u64,
        bytes: &[u8],
        container_width: f64,
        container_height: f64,
    ) -> Result<bool, DecodeError> {
        let ticket = LoadTicket::from_generation(generation);
        match decode_image(bytes) {
            Ok(image) => Ok(self
                .inner
                .finish_load(ticket, image, container_width, container_height)),
            Err(e) => {
                // A stale failure is not worth reporting
                if self.inner.fail_load(ticket) {
                    Err(e)
                } else {
                    Ok(false)
                }
            }
        }
    }

    fn export_now(&mut self) -> Result<Option<JsExport>, ExportError> {
        let Some(ticket) = self.inner.begin_export() else {
            return Ok(None);
        };
        let result = match self.inner.editor() {
            Some(editor) => editor.export(),
            None => Err(ExportError::EmptyImage),
        };
        match result {
            Ok(exported) => Ok(Some(JsExport::new(
                ticket.generation(),
                export_file_name(now_millis()),
                exported.png,
            ))),
            Err(e) => {
                self.inner.abort_export(ticket);
                Err(e)
            }
        }
    }
}
