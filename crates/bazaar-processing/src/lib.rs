//! Image processing for listing photos
//!
//! - [`raster`]: resampling, blur and orientation kernels
//! - [`exif`]: orientation lookup in JPEG streams
//! - [`validator`]: content-type and size checks for uploads
//! - [`pipeline`]: full-size and thumbnail derivation

pub mod exif;
pub mod pipeline;
pub mod raster;
pub mod validator;

pub use exif::{orientation_from_bytes, read_orientation, DEFAULT_ORIENTATION};
pub use pipeline::{
    decode, derive_assets, encode_jpeg, render_full_size, render_thumbnail, DerivedAssets,
    EncodedAsset, ProcessingError, ResizePlan, FULL_SIZE_PLAN, JPEG_QUALITY, THUMBNAIL_PLAN,
};
pub use raster::{
    bicubic_coefficients, blur_gaussian_3x3, fit_within, inverse_orientation, reorient,
    resize_bicubic, resize_bilinear, Orientation,
};
pub use validator::{normalize_mime_type, SupportedImageType, UploadValidator, ValidationError};
