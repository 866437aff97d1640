//! RGBA drawing surface with affine image drawing.
//!
//! Drawing uses inverse mapping: for each surface pixel inside the projected
//! image quad, the pixel center is mapped back into image space and sampled.
//! Results are composited source-over with straight alpha, like a 2D canvas.

use glam::{DAffine2, DVec2};

use super::InterpolationFilter;
use crate::decode::DecodedImage;

/// An owned RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    /// RGBA data, row-major, 4 bytes per pixel.
    pub pixels: Vec<u8>,
}

impl Surface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.index(x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Draw `image` centered on the origin of `transform`.
    ///
    /// `transform` maps image-local coordinates (origin at the image center)
    /// to surface pixels. A singular transform draws nothing.
    pub fn draw_image(
        &mut self,
        image: &DecodedImage,
        transform: DAffine2,
        filter: InterpolationFilter,
    ) {
        if image.is_empty() || self.is_empty() {
            return;
        }
        let det = transform.matrix2.determinant();
        if det == 0.0 || !det.is_finite() {
            return;
        }
        let inverse = transform.inverse();

        let half_w = f64::from(image.width) / 2.0;
        let half_h = f64::from(image.height) / 2.0;
        let Some((x0, y0, x1, y1)) = self.clip_bounds(transform, half_w, half_h) else {
            return;
        };

        let (img_w, img_h) = (f64::from(image.width), f64::from(image.height));
        for py in y0..y1 {
            for px in x0..x1 {
                let center = DVec2::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                let local = inverse.transform_point2(center);
                let u = local.x + half_w;
                let v = local.y + half_h;
                if u < 0.0 || v < 0.0 || u >= img_w || v >= img_h {
                    continue;
                }
                let src = filter.sample(image, u, v);
                let idx = self.index(px, py);
                blend_over(&mut self.pixels[idx..idx + 4], src);
            }
        }
    }

    /// Pixel rectangle covered by the projected image, clipped to the surface.
    fn clip_bounds(
        &self,
        transform: DAffine2,
        half_w: f64,
        half_h: f64,
    ) -> Option<(u32, u32, u32, u32)> {
        let corners = [
            DVec2::new(-half_w, -half_h),
            DVec2::new(half_w, -half_h),
            DVec2::new(half_w, half_h),
            DVec2::new(-half_w, half_h),
        ]
        .map(|c| transform.transform_point2(c));

        let min = corners.iter().fold(DVec2::splat(f64::INFINITY), |a, c| a.min(*c));
        let max = corners
            .iter()
            .fold(DVec2::splat(f64::NEG_INFINITY), |a, c| a.max(*c));

        let x0 = min.x.floor().max(0.0);
        let y0 = min.y.floor().max(0.0);
        let x1 = max.x.ceil().min(f64::from(self.width));
        let y1 = max.y.ceil().min(f64::from(self.height));
        if !(x0 < x1 && y0 < y1) {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Source-over compositing of a straight-alpha sample onto a pixel.
fn blend_over(dst: &mut [u8], src: [f64; 4]) {
    let src_a = (src[3] / 255.0).clamp(0.0, 1.0);
    if src_a >= 1.0 {
        for i in 0..4 {
            dst[i] = src[i].clamp(0.0, 255.0).round() as u8;
        }
        return;
    }

    let dst_a = f64::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let c = (src[i] * src_a + f64::from(dst[i]) * dst_a * (1.0 - src_a)) / out_a;
        dst[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_surface() {
        let s = Surface::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(s.pixels.len(), 24);
        assert_eq!(s.pixel(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn test_identity_draw_copies_pixels() {
        let img = DecodedImage::new(
            2,
            1,
            vec![255, 0, 0, 255, 0, 0, 255, 255],
        );
        let mut s = Surface::new(2, 1);
        // Image centered on (1, 0.5) so it lines up with the surface grid
        s.draw_image(
            &img,
            DAffine2::from_translation(DVec2::new(1.0, 0.5)),
            InterpolationFilter::Bilinear,
        );
        assert_eq!(s.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(s.pixel(1, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_draw_outside_leaves_background() {
        let img = DecodedImage::solid(4, 4, [255, 255, 255, 255]);
        let mut s = Surface::filled(10, 10, [0, 0, 0, 255]);
        s.draw_image(
            &img,
            DAffine2::from_translation(DVec2::new(100.0, 100.0)),
            InterpolationFilter::Bilinear,
        );
        assert!(s.pixels.chunks(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn test_draw_partial_coverage() {
        let img = DecodedImage::solid(4, 4, [255, 255, 255, 255]);
        let mut s = Surface::filled(8, 8, [0, 0, 0, 255]);
        s.draw_image(
            &img,
            DAffine2::from_translation(DVec2::new(4.0, 4.0)),
            InterpolationFilter::Bilinear,
        );
        assert_eq!(s.pixel(4, 4), [255, 255, 255, 255]);
        assert_eq!(s.pixel(2, 2), [255, 255, 255, 255]);
        assert_eq!(s.pixel(1, 1), [0, 0, 0, 255]);
        assert_eq!(s.pixel(6, 6), [0, 0, 0, 255]);
    }

    #[test]
    fn test_singular_transform_draws_nothing() {
        let img = DecodedImage::solid(4, 4, [255, 255, 255, 255]);
        let mut s = Surface::new(4, 4);
        s.draw_image(
            &img,
            DAffine2::from_scale(DVec2::new(0.0, 1.0)),
            InterpolationFilter::Bilinear,
        );
        assert!(s.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blend_half_alpha_over_opaque() {
        let mut dst = [0u8, 0, 0, 255];
        blend_over(&mut dst, [255.0, 255.0, 255.0, 127.5]);
        assert_eq!(dst[3], 255);
        assert!((i32::from(dst[0]) - 128).abs() <= 1);
    }

    #[test]
    fn test_blend_over_transparent_keeps_source() {
        let mut dst = [0u8, 0, 0, 0];
        blend_over(&mut dst, [200.0, 100.0, 50.0, 51.0]);
        assert_eq!(dst, [200, 100, 50, 51]);
    }
}
