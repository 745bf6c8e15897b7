//! Derivation of the two published assets (full-size and thumbnail) from an
//! uploaded original.
//!
//! The full-size asset is bilinear-shrunk to a midway size, reoriented,
//! optionally blurred, then bicubic-shrunk to its final bound. The thumbnail
//! starts from the finished full-size raster and repeats the two shrink steps
//! without blur. Both are encoded as baseline JPEG.

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};

use crate::exif;
use crate::raster::{blur_gaussian_3x3, reorient, resize_bicubic, resize_bilinear};
use crate::validator::SupportedImageType;

/// JPEG quality for every published asset.
pub const JPEG_QUALITY: u8 = 72;

/// Two-step shrink: bilinear to `midway_edge`, then bicubic to `max_edge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub midway_edge: u32,
    pub max_edge: u32,
}

pub const FULL_SIZE_PLAN: ResizePlan = ResizePlan {
    midway_edge: 1080,
    max_edge: 600,
};

pub const THUMBNAIL_PLAN: ResizePlan = ResizePlan {
    midway_edge: 320,
    max_edge: 150,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessingError {
    #[error("Unsupported image type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

/// An encoded JPEG asset and the raster bounds it was encoded from.
#[derive(Debug, Clone)]
pub struct EncodedAsset {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Both assets of one original. Each encode succeeds or fails on its own.
#[derive(Debug)]
pub struct DerivedAssets {
    pub source_width: u32,
    pub source_height: u32,
    pub orientation: u16,
    pub full_size: Result<EncodedAsset, ProcessingError>,
    pub thumbnail: Result<EncodedAsset, ProcessingError>,
}

/// Decode an original into an RGBA raster using the decoder for its declared type.
pub fn decode(data: &[u8], kind: SupportedImageType) -> Result<RgbaImage, ProcessingError> {
    image::load_from_memory_with_format(data, kind.image_format())
        .map(|img| img.to_rgba8())
        .map_err(|e| ProcessingError::Decode(e.to_string()))
}

/// Produce the upright full-size raster.
///
/// Blur is applied only when the original exceeds twice the midway size on
/// either axis.
pub fn render_full_size(source: RgbaImage, orientation: u16) -> RgbaImage {
    let oversized = source.width() > 2 * FULL_SIZE_PLAN.midway_edge
        || source.height() > 2 * FULL_SIZE_PLAN.midway_edge;

    let midway = resize_bilinear(source, FULL_SIZE_PLAN.midway_edge);
    let upright = reorient(midway, orientation);
    let smoothed = if oversized {
        blur_gaussian_3x3(&upright)
    } else {
        upright
    };
    resize_bicubic(smoothed, FULL_SIZE_PLAN.max_edge)
}

/// Produce the thumbnail raster from a finished full-size raster.
pub fn render_thumbnail(full_size: RgbaImage) -> RgbaImage {
    let midway = resize_bilinear(full_size, THUMBNAIL_PLAN.midway_edge);
    resize_bicubic(midway, THUMBNAIL_PLAN.max_edge)
}

/// Encode as JPEG at the given quality. Alpha is discarded.
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> Result<EncodedAsset, ProcessingError> {
    let rgb: RgbImage = img.convert();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality)
        .encode_image(&rgb)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;

    Ok(EncodedAsset {
        data,
        width: img.width(),
        height: img.height(),
    })
}

/// Decode `data` and derive both published assets.
///
/// Only a decode failure fails the whole call; encode failures are reported
/// per asset.
pub fn derive_assets(
    data: &[u8],
    kind: SupportedImageType,
) -> Result<DerivedAssets, ProcessingError> {
    let start = std::time::Instant::now();
    let source = decode(data, kind)?;
    let (source_width, source_height) = source.dimensions();

    let orientation = match kind {
        SupportedImageType::Jpeg => exif::orientation_from_bytes(data),
        _ => exif::DEFAULT_ORIENTATION,
    };

    let full = render_full_size(source, orientation);
    let full_size = encode_jpeg(&full, JPEG_QUALITY);
    let thumb = render_thumbnail(full);
    let thumbnail = encode_jpeg(&thumb, JPEG_QUALITY);

    tracing::debug!(
        source_width,
        source_height,
        orientation,
        format = %kind,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Derived image assets"
    );

    Ok(DerivedAssets {
        source_width,
        source_height,
        orientation,
        full_size,
        thumbnail,
    })
}
