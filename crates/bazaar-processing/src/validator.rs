use image::ImageFormat;
use std::fmt;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("file too large: exceeds {max} bytes")]
    FileTooLarge { max: usize },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

/// Image encodings accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedImageType {
    Gif,
    Jpeg,
    Png,
}

impl SupportedImageType {
    pub const ALL: [SupportedImageType; 3] = [
        SupportedImageType::Gif,
        SupportedImageType::Jpeg,
        SupportedImageType::Png,
    ];

    /// Map a (normalized) MIME type to a supported image type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match normalize_mime_type(mime).as_str() {
            "image/gif" => Some(SupportedImageType::Gif),
            "image/jpeg" | "image/jpg" => Some(SupportedImageType::Jpeg),
            "image/png" => Some(SupportedImageType::Png),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            SupportedImageType::Gif => "image/gif",
            SupportedImageType::Jpeg => "image/jpeg",
            SupportedImageType::Png => "image/png",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            SupportedImageType::Gif => ImageFormat::Gif,
            SupportedImageType::Jpeg => ImageFormat::Jpeg,
            SupportedImageType::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for SupportedImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Strip parameters (e.g. `; charset=binary`) and lowercase a MIME type.
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// Per-file upload checks: declared content type against an allow-list and
/// accumulated size against a byte cap.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| normalize_mime_type(ct))
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate the declared content type, returning the decoder to use.
    pub fn validate_content_type(
        &self,
        content_type: &str,
    ) -> Result<SupportedImageType, ValidationError> {
        let normalized = normalize_mime_type(content_type);

        let allowed = self.allowed_content_types.iter().any(|ct| ct == &normalized);
        match SupportedImageType::from_mime(&normalized) {
            Some(kind) if allowed => Ok(kind),
            _ => Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            }),
        }
    }

    /// Accept a file of exactly `max_file_size` bytes, reject anything larger.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                max: self.max_file_size,
            });
        }
        Ok(())
    }
}
