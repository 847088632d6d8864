// src/error.rs
//! Failure taxonomy for the upload workflow

use thiserror::Error;

/// Rejection of a selected file, raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Only PDF files are supported. Received: {received}")]
    InvalidFormat { received: String },

    #[error("File too large: {:.1}MB (max 10MB)", megabytes(.size))]
    TooLarge { size: u64 },

    #[error("No file selected")]
    NoFile,

    #[error("Only one PDF can be uploaded at a time ({count} selected)")]
    TooManyFiles { count: usize },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::TooLarge { .. } => "FILE_TOO_LARGE",
            Self::NoFile => "NO_FILE",
            Self::TooManyFiles { .. } => "TOO_MANY_FILES",
        }
    }
}

fn megabytes(size: &u64) -> f64 {
    *size as f64 / 1024.0 / 1024.0
}

/// The request never produced a usable HTTP 2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("Unable to reach the extraction service. Check your connection and try again.")]
    Connection { detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Logical,
    MalformedResponse,
}

/// Every way a submission can fail. All variants end the workflow in a
/// recoverable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered 200 with `success: false`.
    #[error("{0}")]
    Logical(String),

    #[error("Malformed response from the extraction service: {0}")]
    MalformedResponse(String),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Logical(_) => ErrorKind::Logical,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    /// Headline shown in the failure notification.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid File",
            _ => "Upload Failed",
        }
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::Transport(TransportError::Connection {
            detail: detail.into(),
        })
    }

    pub fn status(status: u16) -> Self {
        Self::Transport(TransportError::Status { status })
    }
}
