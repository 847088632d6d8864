// src/types/upload.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::pdf_validator::MAX_FILE_SIZE;
use crate::utils::{ensure_dir_exists, file_name_only};

/// A file selected for extraction, held in memory for the lifetime of the
/// submission so it can be retried or saved back out without re-reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    content_type: String,
    size: u64,
    bytes: Arc<Vec<u8>>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            bytes: Arc::new(bytes),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    ///
    /// Files over [`MAX_FILE_SIZE`] are not read: only their size is kept, so
    /// validation can reject them without buffering the content.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?
            .len();

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Path has no usable file name: {}", path.display()))?;

        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        if size > MAX_FILE_SIZE {
            return Ok(Self {
                name,
                content_type,
                size,
                bytes: Arc::new(Vec::new()),
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Write the in-memory copy into `dir` under its original name.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        ensure_dir_exists(dir).await?;

        let target = dir.join(file_name_only(&self.name));
        tokio::fs::write(&target, self.bytes.as_slice())
            .await
            .with_context(|| format!("Failed to write file: {}", target.display()))?;

        Ok(target)
    }
}
