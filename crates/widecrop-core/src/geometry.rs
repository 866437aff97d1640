//! Crop-frame geometry: the view transform and the coverage constraint.
//!
//! The editor shows an image behind a fixed 21:9 crop frame. The image can be
//! panned, zoomed and rotated in quarter turns, but the frame must always be
//! fully covered by image content. Everything here is pure arithmetic on
//! `f64` values so it can be shared by the interactive preview and the export.
//!
//! # Coordinate System
//!
//! - Frame-local pixels, origin at the center of the crop frame, y down
//! - `Transform::x`/`Transform::y` offset the image center from the frame center
//! - Rotation is clockwise on screen, in 90° steps

/// Fixed aspect ratio of the crop frame (21:9).
pub const CROP_RATIO: f64 = 21.0 / 9.0;

/// Quarter-turn rotation of the image inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Build a rotation from any whole number of degrees.
    ///
    /// The angle is normalized modulo 360 and snapped down to the nearest
    /// quarter turn, so `-90` becomes `Deg270` and `450` becomes `Deg90`.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    /// Angle in degrees (0, 90, 180 or 270).
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Angle in radians.
    pub fn radians(self) -> f64 {
        f64::from(self.degrees()).to_radians()
    }

    /// Advance by one clockwise quarter turn.
    pub fn next(self) -> Self {
        Self::from_degrees(self.degrees() + 90)
    }

    /// Returns true for odd quarter turns, which swap width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Exact `(sin, cos)` for the quarter turn.
    ///
    /// Going through `f64::sin_cos` leaves ~1e-16 residue at 90° which shows
    /// up as sub-pixel skew in the rasterizer.
    pub fn sin_cos(self) -> (f64, f64) {
        match self {
            Rotation::Deg0 => (0.0, 1.0),
            Rotation::Deg90 => (1.0, 0.0),
            Rotation::Deg180 => (0.0, -1.0),
            Rotation::Deg270 => (-1.0, 0.0),
        }
    }
}

/// Intrinsic pixel dimensions of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width and height after the rotation is applied.
    pub fn effective(self, rotation: Rotation) -> (f64, f64) {
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        if rotation.swaps_dimensions() {
            (h, w)
        } else {
            (w, h)
        }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// On-screen size of the crop frame in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropArea {
    pub width: f64,
    pub height: f64,
}

impl CropArea {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Fit the largest 21:9 frame into a container.
    ///
    /// The frame takes `width_fraction` of the container width, unless that
    /// makes it taller than `height_fraction` of the container height, in
    /// which case the height is capped and the width follows from the ratio.
    pub fn for_container(
        container_width: f64,
        container_height: f64,
        width_fraction: f64,
        height_fraction: f64,
    ) -> Self {
        if !(container_width > 0.0 && container_height > 0.0) {
            return Self::default();
        }

        let mut width = container_width * width_fraction;
        let mut height = width / CROP_RATIO;

        let max_height = container_height * height_fraction;
        if height > max_height {
            height = max_height;
            width = height * CROP_RATIO;
        }

        Self { width, height }
    }

    /// A frame that has not been measured yet (or a collapsed container).
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// View transform of the image relative to the crop frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal offset of the image center from the frame center.
    pub x: f64,
    /// Vertical offset of the image center from the frame center.
    pub y: f64,
    /// Uniform scale factor applied to the image.
    pub scale: f64,
    pub rotation: Rotation,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: Rotation::Deg0,
        }
    }
}

impl Transform {
    /// Centered transform at the covering scale for `rotation`.
    pub fn covering(image: ImageSize, crop: CropArea, rotation: Rotation) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: covering_scale(image, crop, rotation),
            rotation,
        }
    }

    /// Largest pan offsets that keep the frame inside the scaled image.
    pub fn pan_limits(&self, image: ImageSize, crop: CropArea) -> (f64, f64) {
        let (eff_w, eff_h) = image.effective(self.rotation);
        let max_x = (eff_w * self.scale - crop.width) / 2.0;
        let max_y = (eff_h * self.scale - crop.height) / 2.0;
        (max_x.max(0.0), max_y.max(0.0))
    }
}

/// Minimum scale at which the rotated image fully covers the crop frame.
///
/// Returns 1.0 for an empty image so callers never divide by zero.
pub fn covering_scale(image: ImageSize, crop: CropArea, rotation: Rotation) -> f64 {
    if image.is_empty() {
        return 1.0;
    }
    let (eff_w, eff_h) = image.effective(rotation);
    (crop.width / eff_w).max(crop.height / eff_h)
}

/// Clamp a candidate transform so the image covers the crop frame.
///
/// Scale may only grow to reach coverage; pan is then limited to half the
/// overhang on each axis. The result is idempotent under a second call.
/// Degenerate inputs (unmeasured frame, empty image) pass through unchanged.
pub fn constrain(candidate: Transform, image: ImageSize, crop: CropArea) -> Transform {
    if image.is_empty() || crop.is_empty() {
        return candidate;
    }

    let min_scale = covering_scale(image, crop, candidate.rotation);
    // NaN from a bad gesture sample must not poison the session
    let scale = if candidate.scale.is_nan() {
        min_scale
    } else {
        candidate.scale.max(min_scale)
    };

    let (eff_w, eff_h) = image.effective(candidate.rotation);
    let max_x = ((eff_w * scale - crop.width) / 2.0).max(0.0);
    let max_y = ((eff_h * scale - crop.height) / 2.0).max(0.0);

    Transform {
        x: clamp_or_zero(candidate.x, max_x),
        y: clamp_or_zero(candidate.y, max_y),
        scale,
        rotation: candidate.rotation,
    }
}

fn clamp_or_zero(value: f64, limit: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-limit, limit)
    }
}

/// Pan by a pointer delta, then constrain.
pub fn pan_by(current: Transform, dx: f64, dy: f64, image: ImageSize, crop: CropArea) -> Transform {
    constrain(
        Transform {
            x: current.x + dx,
            y: current.y + dy,
            ..current
        },
        image,
        crop,
    )
}

/// Add a scale delta, then constrain.
pub fn zoom_by(current: Transform, delta: f64, image: ImageSize, crop: CropArea) -> Transform {
    constrain(
        Transform {
            scale: current.scale + delta,
            ..current
        },
        image,
        crop,
    )
}

/// Quarter turn clockwise, discarding pan and zoom.
pub fn rotate_quarter(current: Transform, image: ImageSize, crop: CropArea) -> Transform {
    Transform::covering(image, crop, current.rotation.next())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn scenario() -> (ImageSize, CropArea) {
        (ImageSize::new(800, 600), CropArea::new(630.0, 270.0))
    }

    #[test]
    fn test_rotation_from_degrees_normalizes() {
        assert_eq!(Rotation::from_degrees(0), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees(360), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees(450), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(-90), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees(180), Rotation::Deg180);
    }

    #[test]
    fn test_rotation_next_cycles() {
        let mut r = Rotation::Deg0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            r = r.next();
            seen.push(r.degrees());
        }
        assert_eq!(seen, vec![90, 180, 270, 0]);
    }

    #[test]
    fn test_rotation_sin_cos_matches_trig() {
        for r in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let (s, c) = r.sin_cos();
            assert!((s - r.radians().sin()).abs() < 1e-12);
            assert!((c - r.radians().cos()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_effective_dimensions_swap() {
        let size = ImageSize::new(800, 600);
        assert_eq!(size.effective(Rotation::Deg0), (800.0, 600.0));
        assert_eq!(size.effective(Rotation::Deg90), (600.0, 800.0));
        assert_eq!(size.effective(Rotation::Deg180), (800.0, 600.0));
        assert_eq!(size.effective(Rotation::Deg270), (600.0, 800.0));
    }

    #[test]
    fn test_crop_area_width_bound() {
        // 900 wide -> ~385.7 tall, well under the 800 cap
        let crop = CropArea::for_container(1000.0, 1000.0, 0.9, 0.8);
        assert!((crop.width - 900.0).abs() < EPS);
        assert!((crop.height - 900.0 / CROP_RATIO).abs() < EPS);
    }

    #[test]
    fn test_crop_area_height_bound() {
        let crop = CropArea::for_container(2000.0, 300.0, 0.9, 0.8);
        assert!((crop.height - 240.0).abs() < EPS);
        assert!((crop.width - 240.0 * CROP_RATIO).abs() < EPS);
    }

    #[test]
    fn test_crop_area_keeps_ratio() {
        for (w, h) in [(700.0, 300.0), (375.0, 812.0), (1920.0, 1080.0), (50.0, 10.0)] {
            let crop = CropArea::for_container(w, h, 0.9, 0.8);
            assert!((crop.width / crop.height - CROP_RATIO).abs() < 1e-9);
            assert!(crop.width <= w * 0.9 + EPS);
            assert!(crop.height <= h * 0.8 + EPS);
        }
    }

    #[test]
    fn test_crop_area_empty_container() {
        assert!(CropArea::for_container(0.0, 500.0, 0.9, 0.8).is_empty());
        assert!(CropArea::for_container(500.0, -1.0, 0.9, 0.8).is_empty());
    }

    #[test]
    fn test_initial_scenario() {
        let (image, crop) = scenario();
        let t = Transform::covering(image, crop, Rotation::Deg0);
        assert!((t.scale - 0.7875).abs() < EPS);
        assert_eq!((t.x, t.y, t.rotation), (0.0, 0.0, Rotation::Deg0));
    }

    #[test]
    fn test_drag_scenario_clamps_x_only() {
        let (image, crop) = scenario();
        let start = Transform::covering(image, crop, Rotation::Deg0);
        let moved = pan_by(start, 50.0, 10.0, image, crop);

        // maxX = (800 * 0.7875 - 630) / 2 = 0
        assert!(moved.x.abs() < EPS);
        // maxY = (600 * 0.7875 - 270) / 2 = 101.25
        assert!((moved.y - 10.0).abs() < EPS);
        assert!((moved.pan_limits(image, crop).1 - 101.25).abs() < EPS);
    }

    #[test]
    fn test_rotate_scenario_resets() {
        let (image, crop) = scenario();
        let start = Transform {
            x: 0.0,
            y: -40.0,
            scale: 2.0,
            rotation: Rotation::Deg0,
        };
        let rotated = rotate_quarter(start, image, crop);
        assert_eq!(rotated.rotation, Rotation::Deg90);
        assert!((rotated.scale - 1.05).abs() < EPS);
        assert_eq!((rotated.x, rotated.y), (0.0, 0.0));
    }

    #[test]
    fn test_zoom_out_below_cover_is_blocked() {
        let (image, crop) = scenario();
        let start = Transform::covering(image, crop, Rotation::Deg0);
        let zoomed = zoom_by(start, -0.5, image, crop);
        assert!((zoomed.scale - start.scale).abs() < EPS);
    }

    #[test]
    fn test_zoom_in_widens_pan_range() {
        let (image, crop) = scenario();
        let start = Transform::covering(image, crop, Rotation::Deg0);
        let zoomed = zoom_by(start, 0.2125, image, crop);
        assert!((zoomed.scale - 1.0).abs() < EPS);
        let panned = pan_by(zoomed, 1000.0, -1000.0, image, crop);
        // (800 - 630) / 2 = 85, (600 - 270) / 2 = 165
        assert!((panned.x - 85.0).abs() < EPS);
        assert!((panned.y + 165.0).abs() < EPS);
    }

    #[test]
    fn test_constrain_passes_through_unmeasured_frame() {
        let image = ImageSize::new(800, 600);
        let candidate = Transform {
            x: 999.0,
            y: 999.0,
            scale: 0.01,
            rotation: Rotation::Deg0,
        };
        assert_eq!(constrain(candidate, image, CropArea::default()), candidate);
    }

    #[test]
    fn test_constrain_replaces_nan() {
        let (image, crop) = scenario();
        let candidate = Transform {
            x: f64::NAN,
            y: 3.0,
            scale: f64::NAN,
            rotation: Rotation::Deg0,
        };
        let t = constrain(candidate, image, crop);
        assert!((t.scale - 0.7875).abs() < EPS);
        assert_eq!(t.x, 0.0);
    }

    #[test]
    fn test_covering_scale_empty_image() {
        let crop = CropArea::new(630.0, 270.0);
        assert_eq!(covering_scale(ImageSize::new(0, 10), crop, Rotation::Deg0), 1.0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
