//! Upload validation rules
//!
//! Shared between the upload route handler and the analysis runner so
//! that both reject bad files before any network call is made.

use crate::error::Error;
use crate::Result;

/// Maximum accepted upload size (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for analysis uploads
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "text/csv",
    "application/json",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
];

/// Guess a MIME type from a file name extension.
///
/// Used by callers that only have a selected file name (the runner
/// validates before building the multipart request).
pub fn mime_for_filename(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext)?;
    match ext.to_ascii_lowercase().as_str() {
        "csv" => Some("text/csv"),
        "json" => Some("application/json"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Validate an upload before it is forwarded anywhere.
///
/// Checks the MIME type against the allowed set and the size against
/// the ceiling. Messages are stable and user-visible.
pub fn validate_upload(content_type: &str, len: usize) -> Result<()> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();

    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(Error::invalid_upload("Unsupported file type."));
    }

    if len > MAX_UPLOAD_BYTES {
        return Err(Error::invalid_upload("File exceeds the 5 MiB upload limit."));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types_pass() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate_upload(mime, 1024).is_ok(), "{mime} should pass");
        }
    }

    #[test]
    fn test_disallowed_type_rejected() {
        let err = validate_upload("application/pdf", 1024).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type.");
    }

    #[test]
    fn test_charset_parameter_is_ignored() {
        assert!(validate_upload("text/csv; charset=utf-8", 1024).is_ok());
    }

    #[test]
    fn test_size_ceiling() {
        assert!(validate_upload("text/csv", MAX_UPLOAD_BYTES).is_ok());
        let err = validate_upload("text/csv", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "File exceeds the 5 MiB upload limit.");
    }

    #[test]
    fn test_mime_for_filename() {
        assert_eq!(mime_for_filename("data.csv"), Some("text/csv"));
        assert_eq!(mime_for_filename("metrics.JSON"), Some("application/json"));
        assert_eq!(mime_for_filename("chart.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_filename("report.pdf"), None);
        assert_eq!(mime_for_filename("no_extension"), None);
    }
}
