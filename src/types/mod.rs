// src/types/mod.rs
pub mod response;
pub mod upload;

pub use response::{ApiResponse, Extraction, ExtractionResult, ExtractionSummary};
pub use upload::UploadFile;
