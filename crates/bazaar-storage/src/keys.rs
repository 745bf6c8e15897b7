//! Object naming for derived images.
//!
//! A requested name `N` produces two objects: `N.jpg` (full size) and
//! `N_thumb.jpg` (thumbnail).

use crate::{Storage, StorageResult};

pub const FULL_SIZE_SUFFIX: &str = ".jpg";
pub const THUMBNAIL_SUFFIX: &str = "_thumb.jpg";

pub fn full_size_object_name(requested_name: &str) -> String {
    format!("{}{}", requested_name, FULL_SIZE_SUFFIX)
}

pub fn thumbnail_object_name(requested_name: &str) -> String {
    format!("{}{}", requested_name, THUMBNAIL_SUFFIX)
}

/// Strip everything up to the last `/`, so a stored URL or a prefixed key can be
/// turned back into the requested name.
pub fn image_base_name(name_or_url: &str) -> &str {
    match name_or_url.rfind('/') {
        Some(idx) => &name_or_url[idx + 1..],
        None => name_or_url,
    }
}

/// Delete both derived objects of an image.
///
/// Both deletes are attempted; the first error is returned.
pub async fn delete_image(storage: &dyn Storage, name_or_url: &str) -> StorageResult<()> {
    let requested_name = image_base_name(name_or_url);
    let full = storage.delete(&full_size_object_name(requested_name)).await;
    let thumb = storage.delete(&thumbnail_object_name(requested_name)).await;

    tracing::info!(
        requested_name = %requested_name,
        full_ok = full.is_ok(),
        thumb_ok = thumb.is_ok(),
        "Deleted derived image objects"
    );

    full.and(thumb)
}
