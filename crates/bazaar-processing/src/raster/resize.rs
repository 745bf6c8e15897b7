use image::{Rgba, RgbaImage};

use super::clamped_pixel;

/// Bounds of `width`×`height` scaled so the longer edge equals `max_edge`.
///
/// Returns `None` when both edges already fit, meaning the image is used as is.
/// The shorter edge is rounded and never drops below one pixel.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> Option<(u32, u32)> {
    let max_edge = max_edge.max(1);
    if width <= max_edge && height <= max_edge {
        return None;
    }

    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    let scaled = (f64::from(short) * f64::from(max_edge) / f64::from(long))
        .round()
        .max(1.0) as u32;

    if width >= height {
        Some((max_edge, scaled))
    } else {
        Some((scaled, max_edge))
    }
}

/// Source coordinate for each destination index along one axis:
/// the integer base and the fractional offset.
fn source_positions(src_len: u32, dst_len: u32) -> Vec<(i64, f64)> {
    let ratio = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|i| {
            let pos = f64::from(i) * ratio;
            let base = pos.floor();
            (base as i64, pos - base)
        })
        .collect()
}

/// Downscale with bilinear interpolation so the longer edge is `max_edge`.
///
/// Blended channels are clamped to `[0, 255]` and truncated. Images that
/// already fit are returned untouched.
pub fn resize_bilinear(src: RgbaImage, max_edge: u32) -> RgbaImage {
    let Some((dst_w, dst_h)) = fit_within(src.width(), src.height(), max_edge) else {
        return src;
    };

    let xs = source_positions(src.width(), dst_w);
    let ys = source_positions(src.height(), dst_h);

    RgbaImage::from_fn(dst_w, dst_h, |x, y| {
        let (x0, tx) = xs[x as usize];
        let (y0, ty) = ys[y as usize];

        let p00 = clamped_pixel(&src, x0, y0);
        let p10 = clamped_pixel(&src, x0 + 1, y0);
        let p01 = clamped_pixel(&src, x0, y0 + 1);
        let p11 = clamped_pixel(&src, x0 + 1, y0 + 1);

        let w00 = (1.0 - tx) * (1.0 - ty);
        let w10 = tx * (1.0 - ty);
        let w01 = (1.0 - tx) * ty;
        let w11 = tx * ty;

        let mut out = [0u8; 4];
        for (c, value) in out.iter_mut().enumerate() {
            let blended = f64::from(p00[c]) * w00
                + f64::from(p10[c]) * w10
                + f64::from(p01[c]) * w01
                + f64::from(p11[c]) * w11;
            *value = blended.clamp(0.0, 255.0).floor() as u8;
        }
        Rgba(out)
    })
}

/// Cubic convolution weights for the four taps around a fractional offset `t`,
/// normalised to sum to one.
pub fn bicubic_coefficients(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let raw = [
        -t3 + 2.0 * t2 - t,
        t3 - 2.0 * t2 + 1.0,
        -t3 + t2 + t,
        t3 - t2,
    ];
    let sum: f64 = raw.iter().sum();
    raw.map(|c| c / sum)
}

/// Downscale with bicubic interpolation (4×4 taps) so the longer edge is `max_edge`.
///
/// Channels are clamped to `[0, 255]` and floored. Images that already fit are
/// returned untouched.
pub fn resize_bicubic(src: RgbaImage, max_edge: u32) -> RgbaImage {
    let Some((dst_w, dst_h)) = fit_within(src.width(), src.height(), max_edge) else {
        return src;
    };

    let xs: Vec<(i64, [f64; 4])> = source_positions(src.width(), dst_w)
        .into_iter()
        .map(|(base, t)| (base, bicubic_coefficients(t)))
        .collect();
    let ys: Vec<(i64, [f64; 4])> = source_positions(src.height(), dst_h)
        .into_iter()
        .map(|(base, t)| (base, bicubic_coefficients(t)))
        .collect();

    RgbaImage::from_fn(dst_w, dst_h, |x, y| {
        let (x0, cx) = &xs[x as usize];
        let (y0, cy) = &ys[y as usize];

        let mut acc = [0.0f64; 4];
        for (j, wy) in cy.iter().enumerate() {
            for (i, wx) in cx.iter().enumerate() {
                let p = clamped_pixel(&src, x0 - 1 + i as i64, y0 - 1 + j as i64);
                let weight = wx * wy;
                for (c, sum) in acc.iter_mut().enumerate() {
                    *sum += f64::from(p[c]) * weight;
                }
            }
        }

        Rgba(acc.map(|v| v.clamp(0.0, 255.0).floor() as u8))
    })
}
