//! EXIF orientation lookup for JPEG uploads.
//!
//! Only the primary image's orientation tag is consulted. Anything malformed,
//! truncated or unexpected yields the default orientation (1).

use std::io::{BufRead, Cursor, Seek, SeekFrom};

use exif::{In, Reader, Tag, Value};

/// Orientation reported when no usable tag is found.
pub const DEFAULT_ORIENTATION: u16 = 1;

/// Read the EXIF orientation (1..=8) from a JPEG stream positioned anywhere.
///
/// Never fails: non-JPEG input, missing EXIF, bad tag types and out-of-range
/// values all return [`DEFAULT_ORIENTATION`].
pub fn read_orientation<R: BufRead + Seek>(reader: &mut R) -> u16 {
    if let Err(e) = reader.seek(SeekFrom::Start(0)) {
        tracing::debug!(error = %e, "Could not rewind image for EXIF lookup");
        return DEFAULT_ORIENTATION;
    }

    let exif = match Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "No usable EXIF data");
            return DEFAULT_ORIENTATION;
        }
    };

    let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) else {
        return DEFAULT_ORIENTATION;
    };

    match &field.value {
        Value::Short(values) if values.len() == 1 && (1..=8).contains(&values[0]) => values[0],
        other => {
            tracing::debug!(value = ?other, "Ignoring unusable EXIF orientation");
            DEFAULT_ORIENTATION
        }
    }
}

/// [`read_orientation`] over an in-memory buffer.
pub fn orientation_from_bytes(data: &[u8]) -> u16 {
    read_orientation(&mut Cursor::new(data))
}
