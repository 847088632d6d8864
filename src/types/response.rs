use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Fallback shown when the service reports a failure without a usable message.
const DEFAULT_FAILURE_MESSAGE: &str = "Failed to parse PDF";

// ===== Extraction Service Response Types =====

/// Fields the service extracted from the notification. Every field may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub vacancies: Option<String>,
    pub eligibility: Option<String>,
    pub salary: Option<String>,
    pub application_deadline: Option<String>,
    pub application_url: Option<String>,
    pub raw_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub file_name: String,
    pub file_size_bytes: u64,
    pub text_length: u64,
    pub extracted_fields: BTreeMap<String, bool>,
    pub parsing_timestamp: String,
}

impl ExtractionSummary {
    /// Parse `parsing_timestamp`, accepting RFC 3339 and offset-less ISO-8601
    /// (the latter read as UTC).
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.parsing_timestamp.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Envelope returned by `POST /parse-pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ExtractionResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub extraction_summary: Option<ExtractionSummary>,
}

/// A successful response whose envelope has been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub data: ExtractionResult,
    pub extraction_summary: ExtractionSummary,
}

impl ApiResponse {
    pub fn success(data: ExtractionResult, extraction_summary: ExtractionSummary) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            extraction_summary: Some(extraction_summary),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            extraction_summary: None,
        }
    }

    /// Enforce the envelope invariant: `success` implies both `data` and
    /// `extraction_summary` and no `error`; failure implies `error` and neither
    /// payload. Anything else is a malformed response.
    pub fn into_extraction(self) -> Result<Extraction, UploadError> {
        match self {
            ApiResponse {
                success: true,
                data: Some(data),
                error: None,
                extraction_summary: Some(extraction_summary),
            } => Ok(Extraction {
                data,
                extraction_summary,
            }),
            ApiResponse {
                success: true,
                data,
                error,
                extraction_summary,
            } => {
                let mut problems = Vec::new();
                if data.is_none() {
                    problems.push("missing data");
                }
                if extraction_summary.is_none() {
                    problems.push("missing extraction_summary");
                }
                if error.is_some() {
                    problems.push("unexpected error");
                }
                Err(UploadError::MalformedResponse(format!(
                    "success response with {}",
                    problems.join(", ")
                )))
            }
            ApiResponse {
                success: false,
                data: None,
                error: Some(error),
                extraction_summary: None,
            } => {
                let message = if error.trim().is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    error
                };
                Err(UploadError::Logical(message))
            }
            ApiResponse {
                success: false,
                error: None,
                ..
            } => Err(UploadError::MalformedResponse(
                "failure response without an error message".to_string(),
            )),
            ApiResponse { success: false, .. } => Err(UploadError::MalformedResponse(
                "failure response carrying extraction payload".to_string(),
            )),
        }
    }
}
