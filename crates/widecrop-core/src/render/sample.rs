//! Pixel sampling with bilinear and Lanczos3 interpolation.
//!
//! Sample positions are continuous image coordinates where pixel `(i, j)`
//! covers `[i, i+1) x [j, j+1)` and its center sits at `(i + 0.5, j + 0.5)`,
//! the same convention a canvas `drawImage` uses. Taps that fall outside the
//! bitmap are clamped to the nearest edge pixel, so edges do not darken.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;

/// Interpolation filter used when resampling the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

impl InterpolationFilter {
    /// Sample `image` at continuous coordinates `(u, v)`.
    #[inline]
    pub fn sample(self, image: &DecodedImage, u: f64, v: f64) -> [f64; 4] {
        match self {
            InterpolationFilter::Bilinear => sample_bilinear(image, u, v),
            InterpolationFilter::Lanczos3 => sample_lanczos3(image, u, v),
        }
    }
}

#[inline]
fn texel(image: &DecodedImage, x: i64, y: i64) -> [f64; 4] {
    let cx = x.clamp(0, i64::from(image.width) - 1) as u32;
    let cy = y.clamp(0, i64::from(image.height) - 1) as u32;
    image.pixel(cx, cy).map(f64::from)
}

/// Weighted blend of the 4 nearest texels.
fn sample_bilinear(image: &DecodedImage, u: f64, v: f64) -> [f64; 4] {
    let x = u - 0.5;
    let y = v - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = texel(image, x0, y0);
    let p10 = texel(image, x0 + 1, y0);
    let p01 = texel(image, x0, y0 + 1);
    let p11 = texel(image, x0 + 1, y0 + 1);

    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }
    out
}

/// 6x6 windowed-sinc sample.
fn sample_lanczos3(image: &DecodedImage, u: f64, v: f64) -> [f64; 4] {
    let x = u - 0.5;
    let y = v - 0.5;
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        let py = y0 + ky;
        let wy = lanczos_weight(y - py as f64, 3.0);
        for kx in -2..=3 {
            let px = x0 + kx;
            let weight = lanczos_weight(x - px as f64, 3.0) * wy;
            let p = texel(image, px, py);
            for i in 0..4 {
                sum[i] += p[i] * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, u, v);
    }
    sum.map(|s| (s / weight_sum).clamp(0.0, 255.0))
}

/// Lanczos kernel: `sinc(x) * sinc(x/a)` inside `|x| < a`, zero outside.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    (a * pi_x.sin() * (pi_x / a).sin()) / (pi_x * pi_x)
}
