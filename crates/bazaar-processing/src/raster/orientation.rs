use image::{imageops, RgbaImage};

/// EXIF orientation (tag 0x0112) describing how the stored raster must be
/// transformed to display upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Mirror across the top-left to bottom-right diagonal.
    Transpose,
    /// Rotate 90° clockwise.
    Rotate90,
    /// Mirror across the top-right to bottom-left diagonal.
    Transverse,
    /// Rotate 270° clockwise.
    Rotate270,
}

impl Orientation {
    /// Unknown codes map to `Normal`.
    pub fn from_exif(code: u16) -> Self {
        match code {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }

    pub fn exif_code(self) -> u16 {
        match self {
            Orientation::Normal => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90 => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate270 => 8,
        }
    }

    /// The orientation that undoes this one.
    ///
    /// The two quarter turns swap; flips, half turns and the diagonal mirrors
    /// are their own inverse.
    pub fn inverse(self) -> Self {
        match self {
            Orientation::Rotate90 => Orientation::Rotate270,
            Orientation::Rotate270 => Orientation::Rotate90,
            other => other,
        }
    }

    pub fn apply(self, img: RgbaImage) -> RgbaImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => imageops::flip_horizontal(&img),
            Orientation::Rotate180 => imageops::rotate180(&img),
            Orientation::FlipVertical => imageops::flip_vertical(&img),
            Orientation::Transpose => imageops::flip_horizontal(&imageops::rotate90(&img)),
            Orientation::Rotate90 => imageops::rotate90(&img),
            Orientation::Transverse => imageops::flip_horizontal(&imageops::rotate270(&img)),
            Orientation::Rotate270 => imageops::rotate270(&img),
        }
    }
}

/// Transform `img` so it displays upright given its EXIF orientation code.
pub fn reorient(img: RgbaImage, code: u16) -> RgbaImage {
    let orientation = Orientation::from_exif(code);
    if orientation != Orientation::Normal {
        tracing::debug!(
            orientation = code,
            width = img.width(),
            height = img.height(),
            "Applying EXIF orientation"
        );
    }
    orientation.apply(img)
}

/// EXIF code whose transform undoes `code`. Unknown codes map to 1.
pub fn inverse_orientation(code: u16) -> u16 {
    Orientation::from_exif(code).inverse().exif_code()
}
