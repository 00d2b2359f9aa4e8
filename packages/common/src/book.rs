use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest accepted upload (50 MiB).
pub const MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Lower-cased extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".epub", ".org"];

/// Document format, derived from the file extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Pdf,
    Epub,
    Org,
    Unknown,
}

impl BookFormat {
    pub fn from_filename(filename: &str) -> Self {
        match extension_of(filename).as_str() {
            ".pdf" => Self::Pdf,
            ".epub" => Self::Epub,
            ".org" => Self::Org,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::Org => "org",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookFormat {
    type Err = std::convert::Infallible;

    /// Unrecognised strings map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pdf" => Self::Pdf,
            "epub" => Self::Epub,
            "org" => Self::Org,
            _ => Self::Unknown,
        })
    }
}

/// Reason an upload was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    TooLarge { size: u64, limit: u64 },
    UnsupportedType { extension: String },
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { limit, .. } => write!(
                f,
                "File is too large. Maximum size: {} MB",
                limit / (1024 * 1024)
            ),
            Self::UnsupportedType { .. } => write!(
                f,
                "File type not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(",")
            ),
        }
    }
}

impl std::error::Error for UploadRejection {}

/// Check an upload against the size ceiling and the extension allow-list.
pub fn validate_upload(filename: &str, size: u64) -> Result<BookFormat, UploadRejection> {
    if size > MAX_UPLOAD_SIZE {
        return Err(UploadRejection::TooLarge {
            size,
            limit: MAX_UPLOAD_SIZE,
        });
    }

    let extension = extension_of(filename);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadRejection::UnsupportedType { extension });
    }

    Ok(BookFormat::from_filename(filename))
}

/// Final path element of `filename`.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Lower-cased suffix starting at the last `.` of the final path element,
/// or an empty string when there is none.
pub fn extension_of(filename: &str) -> String {
    let name = base_name(filename);
    name.rfind('.')
        .map(|idx| name[idx..].to_lowercase())
        .unwrap_or_default()
}

/// Book title derived from an upload name: the final path element without its extension.
pub fn title_from_filename(filename: &str) -> String {
    let name = base_name(filename);
    match name.rfind('.') {
        Some(idx) => name[..idx].to_string(),
        None => name.to_string(),
    }
}
