//! Upload validation and staging
//!
//! Turns a user-selected file into a [`StagedArtifact`] the pipeline can own.
//! Staging is purely local: it inspects the declared mime type and the byte
//! length, and never touches the network.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unsupported file type '{mime}'. Accepted: image/png, image/jpeg")]
    UnsupportedType { mime: String },

    #[error("File is {size} bytes, which exceeds the {limit} byte upload limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image formats the verification service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImageMime {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl ImageMime {
    pub fn parse(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageMime::Png),
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the user picked, before validation
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            content: content.into(),
        }
    }

    /// Reads a file from disk, declaring its mime type from the extension
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read(path).map_err(|source| io_error(path, source))?;
        let (name, mime) = (file_name(path), guess_mime(path));

        debug!(file = %name, mime = %mime, size = content.len(), "Read upload from disk");

        Ok(Self::new(name, mime, content))
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ValidationError {
    ValidationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

/// A validated input image, ready to be handed to the orchestrator
#[derive(Debug, Clone)]
pub struct StagedArtifact {
    name: String,
    mime: ImageMime,
    content: Bytes,
}

impl StagedArtifact {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Shared handle to the file content; cloning does not copy the bytes
    pub fn content(&self) -> Bytes {
        self.content.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadStager {
    max_bytes: u64,
}

impl Default for UploadStager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadStager {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Stages a file from disk. Type and size are checked against the file
    /// metadata, so rejected files are never read.
    pub fn stage_path(&self, path: &Path) -> Result<StagedArtifact, ValidationError> {
        let mime = guess_mime(path);
        self.check(&mime, || {
            std::fs::metadata(path)
                .map(|meta| meta.len())
                .map_err(|source| io_error(path, source))
        })?;

        self.validate(UploadFile::from_path(path)?)
    }

    /// Checks type, then emptiness, then size. The limit itself is accepted.
    pub fn validate(&self, file: UploadFile) -> Result<StagedArtifact, ValidationError> {
        let size = file.size();
        let mime = self.check(&file.mime, || Ok(size))?;

        debug!(file = %file.name, %mime, size, "Staged upload");

        Ok(StagedArtifact {
            name: file.name,
            mime,
            content: file.content,
        })
    }

    fn check<F>(&self, mime: &str, size: F) -> Result<ImageMime, ValidationError>
    where
        F: FnOnce() -> Result<u64, ValidationError>,
    {
        let parsed = ImageMime::parse(mime).ok_or_else(|| ValidationError::UnsupportedType {
            mime: mime.to_string(),
        })?;

        let size = size()?;
        if size == 0 {
            return Err(ValidationError::Empty);
        }
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn png(size: usize) -> UploadFile {
        UploadFile::new("doc.png", "image/png", vec![0u8; size])
    }

    #[test]
    fn test_accepts_png_and_jpeg() {
        let stager = UploadStager::new(1024);

        let staged = stager.validate(png(10)).unwrap();
        assert_eq!(staged.mime(), ImageMime::Png);
        assert_eq!(staged.size(), 10);
        assert_eq!(staged.name(), "doc.png");

        let jpeg = UploadFile::new("scan.jpg", "image/jpeg", vec![1u8; 5]);
        assert_eq!(stager.validate(jpeg).unwrap().mime(), ImageMime::Jpeg);
    }

    #[test]
    fn test_staged_artifact_references_file_content() {
        let stager = UploadStager::new(1024);
        let file = UploadFile::new("doc.png", "image/png", vec![1, 2, 3, 4]);

        let staged = stager.validate(file).unwrap();
        assert_eq!(staged.content().as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let stager = UploadStager::new(100);

        assert!(stager.validate(png(100)).is_ok());
        match stager.validate(png(101)) {
            Err(ValidationError::TooLarge { size, limit }) => {
                assert_eq!(size, 101);
                assert_eq!(limit, 100);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_default_limit_is_ten_mebibytes() {
        let stager = UploadStager::default();
        assert_eq!(stager.max_bytes(), 10 * 1024 * 1024);
        assert!(stager.validate(png(10 * 1024 * 1024)).is_ok());
        assert!(matches!(
            stager.validate(png(10 * 1024 * 1024 + 1)),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_file_rejected() {
        let stager = UploadStager::default();
        assert!(matches!(stager.validate(png(0)), Err(ValidationError::Empty)));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let stager = UploadStager::default();
        let pdf = UploadFile::new("doc.pdf", "application/pdf", vec![1u8; 10]);

        match stager.validate(pdf) {
            Err(ValidationError::UnsupportedType { mime }) => assert_eq!(mime, "application/pdf"),
            other => panic!("Expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_mime_parse_is_lenient_on_case_and_alias() {
        assert_eq!(ImageMime::parse("IMAGE/PNG"), Some(ImageMime::Png));
        assert_eq!(ImageMime::parse("image/jpg"), Some(ImageMime::Jpeg));
        assert_eq!(ImageMime::parse("image/gif"), None);
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("contract.jpeg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0xff, 0xd8, 0xff]).unwrap();

        let upload = UploadFile::from_path(&path).unwrap();
        assert_eq!(upload.mime, "image/jpeg");
        assert_eq!(upload.name, "contract.jpeg");
        assert_eq!(upload.size(), 3);
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = UploadFile::from_path(Path::new("/nonexistent/doc.png"));
        assert!(matches!(result, Err(ValidationError::Io { .. })));
    }

    #[test]
    fn test_stage_path_rejects_oversized_file_from_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("huge.png");
        // Sparse, so nothing is written or read
        std::fs::File::create(&path).unwrap().set_len(1 << 32).unwrap();

        match UploadStager::default().stage_path(&path) {
            Err(ValidationError::TooLarge { size, limit }) => {
                assert_eq!(size, 1 << 32);
                assert_eq!(limit, DEFAULT_MAX_UPLOAD_BYTES);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_stage_path_checks_type_before_touching_disk() {
        let result = UploadStager::default().stage_path(Path::new("/nonexistent/notes.txt"));
        assert!(matches!(result, Err(ValidationError::UnsupportedType { .. })));

        let result = UploadStager::default().stage_path(Path::new("/nonexistent/doc.png"));
        assert!(matches!(result, Err(ValidationError::Io { .. })));
    }

    #[test]
    fn test_stage_path_stages_small_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let stager = UploadStager::new(4);
        let staged = stager.stage_path(&path).unwrap();
        assert_eq!(staged.mime(), ImageMime::Png);
        assert_eq!(staged.size(), 4);

        assert!(matches!(
            UploadStager::new(3).stage_path(&path),
            Err(ValidationError::TooLarge { size: 4, limit: 3 })
        ));
    }
}
