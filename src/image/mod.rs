//! Image validation and encoding pipeline
//!
//! A selected file is checked for type, then size, before it replaces the
//! current selection. The preview is produced afterwards in its own step,
//! and a failure there leaves the accepted file in place without a preview.

mod mime;

pub use mime::{is_accepted, mime_from_path};

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::config;
use crate::error::RequestError;
use crate::utils::bytes_to_kb;
use crate::{log_debug, log_error, log_info, log_warn};

const MODULE: &str = "image";

/// Message shown when the preview bytes cannot be read
pub const READ_FAILURE_MESSAGE: &str = "Failed to read image file";

/// A file the user picked, described by what it declares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

impl SelectedFile {
    /// Describe a local file. The MIME type comes from the extension unless given.
    pub async fn from_path(path: &Path, mime_override: Option<&str>) -> Result<Self, String> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            log_error!(MODULE, "Failed to read file info for {}: {}", path.display(), e);
            format!("Failed to read file info: {}", e)
        })?;

        if !metadata.is_file() {
            return Err(format!("Not a file: {}", path.display()));
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mime_type = mime_override
            .map(str::to_string)
            .unwrap_or_else(|| mime_from_path(path).to_string());

        Ok(Self {
            path: path.to_path_buf(),
            filename,
            mime_type,
            size: metadata.len(),
        })
    }

    /// Read the raw bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, String> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", self.path.display(), e))
    }
}

/// Check the declared type, then the size. The first failure wins.
pub fn validate(file: &SelectedFile) -> Result<(), RequestError> {
    if !is_accepted(&file.mime_type) {
        return Err(RequestError::validation(format!(
            "Invalid file type: {}. Please upload JPG, PNG, GIF, or WEBP image.",
            file.mime_type
        )));
    }

    if file.size > config::image::MAX_SIZE_BYTES {
        return Err(RequestError::validation(
            "File too large. Maximum size is 10MB.",
        ));
    }

    Ok(())
}

/// Encode bytes as a `data:` URL suitable for direct display
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Encode accepted bytes as a preview
pub fn encode_preview(mime_type: &str, bytes: &[u8]) -> String {
    log_debug!(MODULE, "Encoding {} bytes for preview", bytes.len());
    to_data_url(mime_type, bytes)
}

/// An accepted file with the exact bytes that passed validation.
/// `bytes` and `preview` are absent when the file could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub file: SelectedFile,
    pub bytes: Option<Vec<u8>>,
    pub preview: Option<String>,
}

/// What happened to a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Validation failed; the previous selection is untouched
    Rejected(RequestError),
    /// The file replaced the previous selection. `preview_error` is set when
    /// the file could not be read for the preview.
    Accepted { preview_error: Option<RequestError> },
}

/// The image pipeline's current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSelection {
    asset: Option<ImageAsset>,
}

impl ImageSelection {
    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.asset.as_ref().and_then(|a| a.preview.as_deref())
    }

    pub fn clear(&mut self) {
        self.asset = None;
    }

    /// Validate `file`, read it once and, if accepted, make it the selection
    /// with its preview. The bytes read here are the ones uploaded later.
    pub async fn select(&mut self, file: SelectedFile) -> SelectionOutcome {
        if let Err(e) = validate(&file) {
            log_warn!(MODULE, "Rejected {}: {}", file.filename, e);
            return SelectionOutcome::Rejected(e);
        }

        let bytes = match file.read_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log_error!(MODULE, "Preview failed for {}: {}", file.filename, e);
                self.asset = Some(ImageAsset {
                    file,
                    bytes: None,
                    preview: None,
                });
                return SelectionOutcome::Accepted {
                    preview_error: Some(RequestError::validation(READ_FAILURE_MESSAGE)),
                };
            }
        };

        // The file may have changed since its size was taken.
        let file = SelectedFile {
            size: bytes.len() as u64,
            ..file
        };
        if let Err(e) = validate(&file) {
            log_warn!(MODULE, "Rejected {} after reading: {}", file.filename, e);
            return SelectionOutcome::Rejected(e);
        }

        log_info!(
            MODULE,
            "Image selected: {} ({}, {:.2} KB)",
            file.filename,
            file.mime_type,
            bytes_to_kb(file.size)
        );

        let preview = encode_preview(&file.mime_type, &bytes);
        self.asset = Some(ImageAsset {
            file,
            bytes: Some(bytes),
            preview: Some(preview),
        });
        SelectionOutcome::Accepted {
            preview_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn described(mime_type: &str, size: u64) -> SelectedFile {
        SelectedFile {
            path: PathBuf::from("/nonexistent/car.bin"),
            filename: "car.bin".to_string(),
            mime_type: mime_type.to_string(),
            size,
        }
    }

    fn temp_png(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_type_check_runs_before_size_check() {
        let err = validate(&described("image/tiff", 20 * 1024 * 1024)).unwrap_err();
        assert_eq!(
            err.message,
            "Invalid file type: image/tiff. Please upload JPG, PNG, GIF, or WEBP image."
        );
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate(&described("image/png", 10 * 1024 * 1024)).is_ok());
        let err = validate(&described("image/png", 10 * 1024 * 1024 + 1)).unwrap_err();
        assert_eq!(err.message, "File too large. Maximum size is 10MB.");
    }

    #[test]
    fn test_data_url() {
        assert_eq!(to_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_select_accepts_and_previews() {
        let file = temp_png(b"\x89PNG fake");
        let selected = SelectedFile::from_path(file.path(), None).await.unwrap();
        assert_eq!(selected.mime_type, "image/png");
        assert_eq!(selected.size, 9);

        let mut selection = ImageSelection::default();
        let outcome = selection.select(selected.clone()).await;
        assert_eq!(outcome, SelectionOutcome::Accepted { preview_error: None });
        assert_eq!(selection.asset().unwrap().file, selected);
        assert!(selection.preview().unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_rejection_keeps_previous_selection() {
        let file = temp_png(b"first");
        let first = SelectedFile::from_path(file.path(), None).await.unwrap();
        let mut selection = ImageSelection::default();
        selection.select(first).await;
        let before = selection.clone();

        let outcome = selection.select(described("text/plain", 10)).await;
        assert!(matches!(outcome, SelectionOutcome::Rejected(_)));
        assert_eq!(selection, before);

        let outcome = selection
            .select(described("image/jpeg", 11 * 1024 * 1024))
            .await;
        assert!(matches!(outcome, SelectionOutcome::Rejected(_)));
        assert_eq!(selection, before);
    }

    #[tokio::test]
    async fn test_read_failure_keeps_asset_without_preview() {
        let file = temp_png(b"first");
        let first = SelectedFile::from_path(file.path(), None).await.unwrap();
        let mut selection = ImageSelection::default();
        selection.select(first).await;
        assert!(selection.preview().is_some());

        let missing = described("image/jpeg", 2048);
        let outcome = selection.select(missing.clone()).await;
        assert_eq!(
            outcome,
            SelectionOutcome::Accepted {
                preview_error: Some(RequestError::validation(READ_FAILURE_MESSAGE))
            }
        );
        assert_eq!(selection.asset().unwrap().file, missing);
        assert!(selection.preview().is_none());
    }

    #[tokio::test]
    async fn test_from_path_honours_override_and_missing_files() {
        let file = temp_png(b"x");
        let selected = SelectedFile::from_path(file.path(), Some("image/webp"))
            .await
            .unwrap();
        assert_eq!(selected.mime_type, "image/webp");

        assert!(SelectedFile::from_path(Path::new("/nonexistent/car.png"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_selection_keeps_the_bytes_it_validated() {
        let file = temp_png(b"\x89PNG original");
        let selected = SelectedFile::from_path(file.path(), None).await.unwrap();
        let mut selection = ImageSelection::default();
        selection.select(selected).await;

        std::fs::write(file.path(), b"changed on disk").unwrap();

        let asset = selection.asset().unwrap();
        assert_eq!(asset.bytes.as_deref(), Some(&b"\x89PNG original"[..]));
        assert_eq!(asset.file.size, 13);
    }

    #[tokio::test]
    async fn test_file_grown_past_limit_before_read_is_rejected() {
        let file = temp_png(b"small");
        let selected = SelectedFile::from_path(file.path(), None).await.unwrap();
        std::fs::write(file.path(), vec![0u8; 10 * 1024 * 1024 + 1]).unwrap();

        let mut selection = ImageSelection::default();
        let outcome = selection.select(selected).await;
        assert_eq!(
            outcome,
            SelectionOutcome::Rejected(RequestError::validation(
                "File too large. Maximum size is 10MB."
            ))
        );
        assert!(selection.asset().is_none());
    }
}
