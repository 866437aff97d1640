//! The crop editor session.
//!
//! All mutable editor state (the view transform, the measured crop frame, the
//! attached image and in-progress gesture tracking) lives in one
//! [`EditorSession`]. Input arrives as [`EditorEvent`]s and every event goes
//! through [`EditorSession::handle`], which computes the next transform with
//! the pure functions in [`crate::geometry`] and commits it in one step.

use crate::config::EditorConfig;
use crate::decode::DecodedImage;
use crate::export::{export_png, ExportError, ExportedImage};
use crate::geometry::{pan_by, rotate_quarter, zoom_by, CropArea, ImageSize, Rotation, Transform};
use crate::render::{render_preview, Surface, Viewport};

/// A pointer or touch contact in client (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Active contacts of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contacts {
    /// Mouse, pen or a single finger.
    One(Point),
    /// Two or more fingers; only the first two count.
    Two(Point, Point),
}

impl Contacts {
    /// Build from the event's contact list; `None` when it is empty.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        match points {
            [] => None,
            [p] => Some(Contacts::One(*p)),
            [a, b, ..] => Some(Contacts::Two(*a, *b)),
        }
    }
}

/// Input understood by the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorEvent {
    PointerDown(Contacts),
    PointerMove(Contacts),
    /// Pointer released, touch ended or cancelled.
    PointerUp,
    /// Vertical wheel delta; negative scrolls up and zooms in.
    Wheel { delta_y: f64 },
    /// Rotate a quarter turn clockwise.
    Rotate,
}

/// Identity of an attached image, used by the initialization latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u64);

#[derive(Debug, Default, Clone, Copy)]
struct Gesture {
    active: bool,
    last_point: Option<Point>,
    last_pinch_distance: Option<f64>,
}

/// State of one crop editor.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    crop: CropArea,
    image: Option<DecodedImage>,
    transform: Transform,
    initialized_for: Option<ImageId>,
    gesture: Gesture,
}

impl EditorSession {
    /// Create a session and measure the crop frame from the container size.
    pub fn new(config: EditorConfig, container_width: f64, container_height: f64) -> Self {
        let crop = CropArea::for_container(
            container_width,
            container_height,
            config.frame_width_fraction,
            config.frame_height_fraction,
        );
        log::debug!(
            "crop frame {:.1}x{:.1} in {}x{} container",
            crop.width,
            crop.height,
            container_width,
            container_height
        );
        Self {
            config,
            crop,
            image: None,
            transform: Transform::default(),
            initialized_for: None,
            gesture: Gesture::default(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn crop_area(&self) -> CropArea {
        self.crop
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    /// Attach the image to edit.
    ///
    /// The first attach of a given `id` resets the transform to the covering
    /// scale at 0°. Attaching the same id again keeps the current framing.
    /// Nothing is initialized while the crop frame is unmeasured.
    pub fn attach_image(&mut self, image: DecodedImage, id: ImageId) {
        let size = image.size();
        self.image = Some(image);
        self.gesture = Gesture::default();

        if self.initialized_for == Some(id) || self.crop.is_empty() || size.is_empty() {
            return;
        }
        self.transform = Transform::covering(size, self.crop, Rotation::Deg0);
        self.initialized_for = Some(id);
        log::debug!(
            "initialized {}x{} image at scale {:.4}",
            size.width,
            size.height,
            self.transform.scale
        );
    }

    /// Apply one input event. Returns true if the transform changed.
    pub fn handle(&mut self, event: EditorEvent) -> bool {
        match event {
            EditorEvent::PointerDown(contacts) => {
                self.gesture.active = true;
                match contacts {
                    Contacts::One(p) => self.gesture.last_point = Some(p),
                    Contacts::Two(..) => self.gesture.last_point = None,
                }
                false
            }
            EditorEvent::PointerMove(contacts) => {
                if !self.gesture.active {
                    return false;
                }
                match contacts {
                    Contacts::One(p) => self.drag_to(p),
                    Contacts::Two(a, b) => self.pinch_to(a.distance(b)),
                }
            }
            EditorEvent::PointerUp => {
                self.gesture = Gesture::default();
                false
            }
            EditorEvent::Wheel { delta_y } => {
                let delta = -delta_y * self.config.wheel_sensitivity;
                self.update(|t, image, crop| zoom_by(t, delta, image, crop))
            }
            EditorEvent::Rotate => {
                let changed = self.update(rotate_quarter);
                if changed {
                    log::debug!(
                        "rotated to {}° at scale {:.4}",
                        self.transform.rotation.degrees(),
                        self.transform.scale
                    );
                }
                changed
            }
        }
    }

    /// Relative drag: move by the delta since the last seen point.
    ///
    /// The pinch distance is left alone; it only resets on release.
    fn drag_to(&mut self, p: Point) -> bool {
        let Some(last) = self.gesture.last_point.replace(p) else {
            return false;
        };
        let (dx, dy) = (p.x - last.x, p.y - last.y);
        self.update(|t, image, crop| pan_by(t, dx, dy, image, crop))
    }

    fn pinch_to(&mut self, distance: f64) -> bool {
        self.gesture.last_point = None;
        let Some(last) = self.gesture.last_pinch_distance.replace(distance) else {
            return false;
        };
        let delta = (distance - last) * self.config.pinch_sensitivity;
        self.update(|t, image, crop| zoom_by(t, delta, image, crop))
    }

    /// Run a transition against the attached image; no-op without one.
    fn update<F>(&mut self, step: F) -> bool
    where
        F: FnOnce(Transform, ImageSize, CropArea) -> Transform,
    {
        let Some(image) = &self.image else {
            return false;
        };
        if self.crop.is_empty() {
            return false;
        }
        let next = step(self.transform, image.size(), self.crop);
        let changed = next != self.transform;
        self.transform = next;
        changed
    }

    /// Draw the preview for a container of the given size.
    ///
    /// `None` when there is no image or the frame is unmeasured.
    pub fn render_preview(&self, viewport: &Viewport) -> Option<Surface> {
        let image = self.image.as_ref()?;
        if self.crop.is_empty() {
            return None;
        }
        render_preview(
            image,
            &self.transform,
            viewport,
            self.config.background,
            self.config.preview_filter,
        )
    }

    /// Export the framed region as a fixed-size PNG.
    pub fn export(&self) -> Result<ExportedImage, ExportError> {
        let image = self.image.as_ref().ok_or(ExportError::EmptyImage)?;
        export_png(image, &self.transform, self.crop, self.config.export_filter)
    }
}
