//! Bazaar Storage Library
//!
//! The storage sink for derived listing images: a [`Storage`] trait with an S3
//! implementation and a local filesystem implementation.
//!
//! # Object names
//!
//! Callers pass plain object names such as `42_listing_7.jpg`. Each backend
//! prepends its configured prefix (`public/` by default), so the same name maps to
//! `s3://bucket/public/42_listing_7.jpg` or `<base_path>/public/42_listing_7.jpg`.
//! Names must not contain `..` or start with `/`. Naming helpers for the two
//! derived assets live in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use bazaar_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{delete_image, full_size_object_name, image_base_name, thumbnail_object_name};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
