//! Client for a job-notification PDF extraction service.
//!
//! A PDF is validated, posted to `{base_url}/parse-pdf` and the structured
//! result is projected into display form. [`core::UploadController`] owns the
//! workflow; [`render`] holds the pure formatting functions.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod pdf_validator;
pub mod render;
pub mod types;
pub mod utils;

pub use config::ClientConfig;
pub use crate::core::{
    ChannelNotifier, ExtractionService, LogNotifier, Notification, Notifier, ServiceClient,
    SubmitOutcome, UploadController, UploadPhase, UploadState,
};
pub use error::{ErrorKind, TransportError, UploadError, ValidationError};
pub use types::{ApiResponse, Extraction, ExtractionResult, ExtractionSummary, UploadFile};
