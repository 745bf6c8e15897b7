//! Background image processing for listing photos
//!
//! Uploads are handed to an [`ImagePool`] as [`ImageProcessRequest`]s. Each
//! submission yields a [`JobHandle`] that resolves to exactly one [`Outcome`].

pub mod job;
pub mod pool;

pub use job::{
    AssetKind, AssetReport, FailedImage, FailureReason, ImageProcessRequest, JobHandle, Outcome,
    ProcessedImage,
};
pub use pool::{ImagePool, ImagePoolConfig, PoolError};
