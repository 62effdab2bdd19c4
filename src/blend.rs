//! Blend Operators
//!
//! Pixel-wise combinations of two images parameterized by a scalar strength.
//! The secondary image is resized to the anchor's dimensions before blending,
//! so the output is always sized like the anchor.

use image::{imageops, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// A blend operator combining an anchor and a secondary image
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixOp {
    /// Plain linear interpolation: `(1 - alpha) * anchor + alpha * secondary`
    Alpha,
    /// Linear interpolation with the strength adjusted for the brightness
    /// difference between the two images, so mixed regions stay visually
    /// consistent when the mixing material has a very different exposure
    Adaptive,
}

impl MixOp {
    /// Blend `secondary` into `anchor` with the given strength.
    ///
    /// The output has the anchor's dimensions and is always 3-channel.
    pub fn blend(&self, anchor: &RgbImage, secondary: &RgbImage, alpha: f32) -> RgbImage {
        let (width, height) = anchor.dimensions();

        let resized;
        let secondary = if secondary.dimensions() == (width, height) {
            secondary
        } else {
            resized = imageops::resize(secondary, width, height, imageops::FilterType::Triangle);
            &resized
        };

        let alpha = match self {
            MixOp::Alpha => alpha.clamp(0.0, 1.0),
            MixOp::Adaptive => {
                let delta = (mean_brightness(anchor) - mean_brightness(secondary)) / 255.0 / 2.0;
                (alpha + delta).clamp(0.0, 1.0)
            }
        };

        let mut output = ImageBuffer::new(width, height);
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            let a = anchor.get_pixel(x, y);
            let b = secondary.get_pixel(x, y);
            let mut mixed = [0u8; 3];
            for c in 0..3 {
                let v = (1.0 - alpha) * a[c] as f32 + alpha * b[c] as f32;
                mixed[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            *pixel = Rgb(mixed);
        }

        output
    }
}

/// Mean of the three color channels over all pixels
fn mean_brightness(img: &RgbImage) -> f32 {
    let mut sum = 0.0f64;
    for pixel in img.pixels() {
        sum += (pixel[0] as f64 + pixel[1] as f64 + pixel[2] as f64) / 3.0;
    }
    (sum / (img.width() as f64 * img.height() as f64)) as f32
}
