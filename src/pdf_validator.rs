// src/pdf_validator.rs
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::types::UploadFile;

pub const PDF_MIME: &str = "application/pdf";
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub struct PdfValidator;

impl PdfValidator {
    /// Check a single file against the upload constraints.
    pub fn validate(file: &UploadFile) -> Result<(), ValidationError> {
        if !file.content_type().eq_ignore_ascii_case(PDF_MIME) {
            warn!(
                "Rejected {}: unsupported content type {}",
                file.name(),
                file.content_type()
            );
            return Err(ValidationError::InvalidFormat {
                received: if file.content_type().is_empty() {
                    "unknown".to_string()
                } else {
                    file.content_type().to_string()
                },
            });
        }

        if file.size() > MAX_FILE_SIZE {
            warn!("Rejected {}: {} bytes over limit", file.name(), file.size());
            return Err(ValidationError::TooLarge { size: file.size() });
        }

        debug!("PDF validation passed: {} ({} bytes)", file.name(), file.size());
        Ok(())
    }

    /// Reduce a selection to the single file it must contain, then validate it.
    pub fn validate_selection(mut files: Vec<UploadFile>) -> Result<UploadFile, ValidationError> {
        match files.len() {
            0 => Err(ValidationError::NoFile),
            1 => {
                let file = files.remove(0);
                Self::validate(&file)?;
                Ok(file)
            }
            count => Err(ValidationError::TooManyFiles { count }),
        }
    }
}
