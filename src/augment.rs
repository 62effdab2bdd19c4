//! Augmentation Operators
//!
//! Stateless, individually-parameterized stochastic transforms that alter
//! geometry or occlude regions without resizing the canvas. Each operator
//! produces a new image and never mutates the caller's copy.
//!
//! All geometric operators inverse-map through the transform and sample the
//! source with bilinear interpolation; pixels that fall outside the source
//! after the transform are filled with constant black.

use image::{imageops, ImageBuffer, Rgb, RgbImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Aspect-ratio range for the erase rectangle, matching the usual
/// random-erasing parameterization.
const ERASE_ASPECT_RANGE: (f32, f32) = (0.3, 3.33);

/// A single augmentation operator with its parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AugmentOp {
    /// Rotate about the image center by a uniform angle in
    /// [-max_degrees, +max_degrees] without expanding the canvas
    Rotate {
        max_degrees: f32,
    },
    /// Flip top-bottom with probability `prob`, otherwise identity
    VerticalFlip {
        prob: f32,
    },
    /// Flip left-right with probability `prob`, otherwise identity
    HorizontalFlip {
        prob: f32,
    },
    /// Combined rotation and translation: uniform angle in
    /// [-max_degrees, +max_degrees], uniform shift up to
    /// `translate.0 * width` and `translate.1 * height`
    Affine {
        max_degrees: f32,
        translate: (f32, f32),
    },
    /// With probability `prob`, paint a random rectangle covering a
    /// uniform fraction of the image area (drawn from `ratio_range`)
    /// with the constant `fill` value
    Erase {
        prob: f32,
        ratio_range: (f32, f32),
        fill: u8,
    },
    /// Perturb each corner by a uniform offset bounded by `jitter` of the
    /// corresponding dimension and warp through the resulting projective
    /// transform onto the original canvas
    Perspective {
        jitter: f32,
    },
}

impl AugmentOp {
    /// Apply this operator to an image, drawing any randomness from `rng`.
    ///
    /// The output always has the same dimensions as the input.
    pub fn apply(&self, img: &RgbImage, rng: &mut ChaCha8Rng) -> RgbImage {
        match *self {
            AugmentOp::Rotate { max_degrees } => {
                let angle = rng.gen_range(-max_degrees..=max_degrees);
                rotate(img, angle)
            }
            AugmentOp::VerticalFlip { prob } => {
                if rng.gen::<f32>() < prob {
                    imageops::flip_vertical(img)
                } else {
                    img.clone()
                }
            }
            AugmentOp::HorizontalFlip { prob } => {
                if rng.gen::<f32>() < prob {
                    imageops::flip_horizontal(img)
                } else {
                    img.clone()
                }
            }
            AugmentOp::Affine {
                max_degrees,
                translate,
            } => {
                let (width, height) = img.dimensions();
                let angle = rng.gen_range(-max_degrees..=max_degrees);
                let max_dx = translate.0 * width as f32;
                let max_dy = translate.1 * height as f32;
                let dx = rng.gen_range(-max_dx..=max_dx);
                let dy = rng.gen_range(-max_dy..=max_dy);
                affine(img, angle, dx, dy)
            }
            AugmentOp::Erase {
                prob,
                ratio_range,
                fill,
            } => {
                if rng.gen::<f32>() < prob {
                    erase(img, ratio_range, fill, rng)
                } else {
                    img.clone()
                }
            }
            AugmentOp::Perspective { jitter } => perspective(img, jitter, rng),
        }
    }

    /// Check that this operator's parameters are sane
    pub fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            AugmentOp::Rotate { max_degrees } => {
                if !max_degrees.is_finite() || max_degrees < 0.0 {
                    return Err(format!("Rotate max_degrees must be >= 0, got {}", max_degrees));
                }
            }
            AugmentOp::VerticalFlip { prob } | AugmentOp::HorizontalFlip { prob } => {
                if !(0.0..=1.0).contains(&prob) {
                    return Err(format!("flip probability must be in [0, 1], got {}", prob));
                }
            }
            AugmentOp::Affine {
                max_degrees,
                translate,
            } => {
                if !max_degrees.is_finite() || max_degrees < 0.0 {
                    return Err(format!("Affine max_degrees must be >= 0, got {}", max_degrees));
                }
                if translate.0 < 0.0 || translate.1 < 0.0 {
                    return Err("Affine translate fractions must be >= 0".to_string());
                }
            }
            AugmentOp::Erase {
                prob, ratio_range, ..
            } => {
                if !(0.0..=1.0).contains(&prob) {
                    return Err(format!("Erase probability must be in [0, 1], got {}", prob));
                }
                if ratio_range.0 <= 0.0 || ratio_range.1 < ratio_range.0 {
                    return Err(format!(
                        "Erase ratio_range must satisfy 0 < min <= max, got ({}, {})",
                        ratio_range.0, ratio_range.1
                    ));
                }
            }
            AugmentOp::Perspective { jitter } => {
                if !(0.0..=0.5).contains(&jitter) {
                    return Err(format!(
                        "Perspective jitter must be in [0, 0.5], got {}",
                        jitter
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Sample a pixel with bilinear interpolation, black outside the source
fn bilinear_sample(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = img.dimensions();

    if x < 0.0 || y < 0.0 || x > (width - 1) as f32 || y > (height - 1) as f32 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut result = [0u8; 3];
    for c in 0..3 {
        let v = p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f32 * fx * (1.0 - fy)
            + p01[c] as f32 * (1.0 - fx) * fy
            + p11[c] as f32 * fx * fy;
        result[c] = v.round().clamp(0.0, 255.0) as u8;
    }

    Rgb(result)
}

/// Rotate about the image center, keeping the canvas size
fn rotate(img: &RgbImage, angle_degrees: f32) -> RgbImage {
    affine(img, angle_degrees, 0.0, 0.0)
}

/// Rotation about the center followed by a translation, inverse-mapped so
/// every output pixel samples the source exactly once
fn affine(img: &RgbImage, angle_degrees: f32, dx: f32, dy: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    let angle_rad = angle_degrees.to_radians();
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();

    let mut output = ImageBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            // Undo the translation, then rotate back around the center
            let tx = x as f32 - dx - cx;
            let ty = y as f32 - dy - cy;

            let src_x = cx + tx * cos_a + ty * sin_a;
            let src_y = cy - tx * sin_a + ty * cos_a;

            output.put_pixel(x, y, bilinear_sample(img, src_x, src_y));
        }
    }

    output
}

/// Paint a random rectangle with a constant fill value.
///
/// The rectangle covers a uniform fraction of the image area drawn from
/// `ratio_range`, with a random aspect ratio; both sides are clamped to the
/// canvas so a fitting offset always exists.
fn erase(img: &RgbImage, ratio_range: (f32, f32), fill: u8, rng: &mut ChaCha8Rng) -> RgbImage {
    let (width, height) = img.dimensions();

    let area = rng.gen_range(ratio_range.0..=ratio_range.1) * (width * height) as f32;
    let aspect = rng.gen_range(ERASE_ASPECT_RANGE.0..=ERASE_ASPECT_RANGE.1);

    let erase_h = ((area * aspect).sqrt().round() as u32).min(height);
    let erase_w = ((area / aspect).sqrt().round() as u32).min(width);

    let y0 = rng.gen_range(0..=height - erase_h);
    let x0 = rng.gen_range(0..=width - erase_w);

    let mut output = img.clone();
    for y in y0..y0 + erase_h {
        for x in x0..x0 + erase_w {
            output.put_pixel(x, y, Rgb([fill, fill, fill]));
        }
    }

    output
}

/// Perturb the four corners and warp through the resulting projective
/// transform, keeping the canvas size
fn perspective(img: &RgbImage, jitter: f32, rng: &mut ChaCha8Rng) -> RgbImage {
    let (width, height) = img.dimensions();
    let w = width as f32;
    let h = height as f32;

    let max_dx = jitter * w;
    let max_dy = jitter * h;
    let offset = |rng: &mut ChaCha8Rng| {
        (
            if max_dx > 0.0 { rng.gen_range(-max_dx..=max_dx) } else { 0.0 },
            if max_dy > 0.0 { rng.gen_range(-max_dy..=max_dy) } else { 0.0 },
        )
    };

    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let mut perturbed = [(0.0f32, 0.0f32); 4];
    for (dst, &(x, y)) in perturbed.iter_mut().zip(corners.iter()) {
        let (ox, oy) = offset(rng);
        *dst = (x + ox, y + oy);
    }

    // Projective transform taking output positions (perturbed corners) back
    // to source positions (original corners); degenerate corner draws keep
    // the image unchanged.
    let coeffs = match solve_projective(&perturbed, &corners) {
        Some(c) => c,
        None => return img.clone(),
    };

    let mut output = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let (src_x, src_y) = project(&coeffs, x as f32, y as f32);
            output.put_pixel(x, y, bilinear_sample(img, src_x, src_y));
        }
    }

    output
}

/// Apply projective coefficients [a..h] to a point:
/// u = (a x + b y + c) / (g x + h y + 1), v = (d x + e y + f) / (g x + h y + 1)
fn project(coeffs: &[f32; 8], x: f32, y: f32) -> (f32, f32) {
    let denom = coeffs[6] * x + coeffs[7] * y + 1.0;
    (
        (coeffs[0] * x + coeffs[1] * y + coeffs[2]) / denom,
        (coeffs[3] * x + coeffs[4] * y + coeffs[5]) / denom,
    )
}

/// Solve the 8-unknown linear system mapping four source points to four
/// destination points, via Gaussian elimination with partial pivoting.
///
/// Returns None when the correspondence is degenerate (collinear corners).
fn solve_projective(from: &[(f32, f32); 4], to: &[(f32, f32); 4]) -> Option<[f32; 8]> {
    // Two equations per correspondence, 8x9 augmented matrix in f64 for
    // numerical headroom
    let mut m = [[0.0f64; 9]; 8];
    for i in 0..4 {
        let (x, y) = (from[i].0 as f64, from[i].1 as f64);
        let (u, v) = (to[i].0 as f64, to[i].1 as f64);
        m[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
        m[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
    }

    for col in 0..8 {
        // Partial pivot
        let pivot_row = (col..8).max_by(|&a, &b| {
            m[a][col]
                .abs()
                .partial_cmp(&m[b][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if m[pivot_row][col].abs() < 1e-9 {
            return None;
        }
        m.swap(col, pivot_row);

        for row in 0..8 {
            if row != col {
                let factor = m[row][col] / m[col][col];
                for k in col..9 {
                    m[row][k] -= factor * m[col][k];
                }
            }
        }
    }

    let mut coeffs = [0.0f32; 8];
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c = (m[i][8] / m[i][i]) as f32;
    }
    Some(coeffs)
}
