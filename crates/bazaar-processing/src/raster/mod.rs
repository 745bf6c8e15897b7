//! Pixel kernel: resampling, blur and orientation transforms over RGBA rasters.
//!
//! Every function here is pure. Sampling outside the source clamps to the nearest
//! edge pixel.

mod blur;
mod orientation;
mod resize;

pub use blur::blur_gaussian_3x3;
pub use orientation::{inverse_orientation, reorient, Orientation};
pub use resize::{bicubic_coefficients, fit_within, resize_bicubic, resize_bilinear};

use image::{Rgba, RgbaImage};

/// Pixel at `(x, y)` with both coordinates clamped into the image.
#[inline]
pub(crate) fn clamped_pixel(src: &RgbaImage, x: i64, y: i64) -> &Rgba<u8> {
    let max_x = i64::from(src.width()) - 1;
    let max_y = i64::from(src.height()) - 1;
    src.get_pixel(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32)
}
