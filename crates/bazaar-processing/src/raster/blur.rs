use image::{Rgba, RgbaImage};

use super::clamped_pixel;

const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];
const KERNEL_WEIGHT: u32 = 16;

/// Apply a 3×3 Gaussian blur (1-2-1 / 2-4-2 / 1-2-1, divided by 16).
///
/// Output has the same dimensions as the input. Border taps clamp to the edge
/// and results are floored.
pub fn blur_gaussian_3x3(src: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let mut acc = [0u32; 4];
        for (dy, row) in KERNEL.iter().enumerate() {
            for (dx, weight) in row.iter().enumerate() {
                let p = clamped_pixel(src, x + dx as i64 - 1, y + dy as i64 - 1);
                for (c, sum) in acc.iter_mut().enumerate() {
                    *sum += u32::from(p[c]) * weight;
                }
            }
        }
        Rgba(acc.map(|sum| (sum / KERNEL_WEIGHT) as u8))
    })
}
