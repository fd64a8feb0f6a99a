//! Format dispatch and content extraction
//!
//! Turns an uploaded file's bytes into the intermediate representation the
//! prompt builder works from. Dispatch is by file extension through
//! `DocumentKind`; every supported format has its own extraction path and
//! every failure comes back as an `AppError` rather than a panic.

use std::path::Path;

use base64::Engine;
use hakobu_core::AppError;

use crate::pdf;
use crate::spreadsheet;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
    Spreadsheet,
    Csv,
}

impl DocumentKind {
    /// Case-insensitive extension dispatch.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" => Some(DocumentKind::Image),
            "pdf" => Some(DocumentKind::Pdf),
            "xlsx" | "xlsm" | "xls" => Some(DocumentKind::Spreadsheet),
            "csv" => Some(DocumentKind::Csv),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        Self::from_extension(ext)
    }
}

/// Base64-encoded image attachment for the extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub media_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// Row data pulled from a spreadsheet or CSV.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RowData {
    pub headers: Vec<String>,
    /// One record per data row, keyed by header.
    pub records: Vec<serde_json::Map<String, serde_json::Value>>,
    pub summary: String,
}

/// Intermediate representation handed to the prompt builder.
#[derive(Debug, Clone)]
pub enum ExtractedContent {
    /// Direct image upload, passed through untouched.
    Image(ImagePayload),
    /// Text pulled from a PDF, with detected tables already appended.
    Text { text: String, has_tables: bool },
    /// Scan-only PDF: the embedded page images, plus whatever scraps of
    /// text were present. Guaranteed non-empty `pages`.
    ScannedPdf {
        pages: Vec<ImagePayload>,
        text: String,
    },
    /// Spreadsheet or CSV rows.
    Rows(RowData),
}

/// Extract format-appropriate content from an uploaded file.
///
/// `declared_mime` is the MIME type recorded at upload time; it is trusted
/// for image passthrough only.
pub fn extract(
    data: &[u8],
    filename: &str,
    declared_mime: &str,
) -> Result<ExtractedContent, AppError> {
    let kind = DocumentKind::from_filename(filename).ok_or_else(|| {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_else(|| "(none)".to_string());
        AppError::UnsupportedFormat(ext)
    })?;

    if data.is_empty() {
        return Err(AppError::Extraction("File is empty".to_string()));
    }

    match kind {
        DocumentKind::Image => Ok(ExtractedContent::Image(image_passthrough(
            data,
            filename,
            declared_mime,
        ))),
        DocumentKind::Pdf => pdf::extract_pdf(data),
        DocumentKind::Spreadsheet => spreadsheet::extract_workbook(data).map(ExtractedContent::Rows),
        DocumentKind::Csv => spreadsheet::extract_csv(data).map(ExtractedContent::Rows),
    }
}

fn image_passthrough(data: &[u8], filename: &str, declared_mime: &str) -> ImagePayload {
    let media_type = if declared_mime.starts_with("image/") {
        declared_mime.to_string()
    } else if filename.to_lowercase().ends_with(".png") {
        "image/png".to_string()
    } else {
        "image/jpeg".to_string()
    };
    ImagePayload {
        media_type,
        data: base64::engine::general_purpose::STANDARD.encode(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_dispatch_is_case_insensitive() {
        assert_eq!(DocumentKind::from_extension("JPG"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_extension("Pdf"), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::from_extension("XLSM"),
            Some(DocumentKind::Spreadsheet)
        );
        assert_eq!(DocumentKind::from_extension("csv"), Some(DocumentKind::Csv));
        assert_eq!(DocumentKind::from_extension("docx"), None);
    }

    #[test]
    fn test_unsupported_extension_is_reported() {
        let err = extract(b"hello", "notes.docx", "application/octet-stream").unwrap_err();
        match err {
            AppError::UnsupportedFormat(ext) => assert_eq!(ext, ".docx"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_extension_is_reported() {
        let err = extract(b"hello", "README", "text/plain").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_empty_file_is_an_extraction_error() {
        let err = extract(b"", "photo.jpg", "image/jpeg").unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_image_passthrough_keeps_declared_mime() {
        let content = extract(&[0xFF, 0xD8, 0xFF, 0xE0], "photo.jpg", "image/jpeg").unwrap();
        match content {
            ExtractedContent::Image(payload) => {
                assert_eq!(payload.media_type, "image/jpeg");
                assert_eq!(
                    base64::engine::general_purpose::STANDARD
                        .decode(&payload.data)
                        .unwrap(),
                    vec![0xFF, 0xD8, 0xFF, 0xE0]
                );
            }
            other => panic!("Expected image passthrough, got {:?}", other),
        }
    }

    #[test]
    fn test_image_passthrough_falls_back_to_extension() {
        let content =
            extract(&[0x89, 0x50, 0x4E, 0x47], "scan.PNG", "application/octet-stream").unwrap();
        match content {
            ExtractedContent::Image(payload) => assert_eq!(payload.media_type, "image/png"),
            other => panic!("Expected image passthrough, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_pdf_never_panics() {
        let err = extract(b"%PDF-1.7 not really a pdf", "broken.pdf", "application/pdf");
        // either a text fallback or a clean error; both stay inside the boundary
        if let Err(err) = err {
            assert!(matches!(err, AppError::Extraction(_)));
        }
    }
}
