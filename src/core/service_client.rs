// src/core/service_client.rs
//! HTTP client for the extraction service

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use std::future::Future;
use tracing::{error, info, trace};

use crate::config::ClientConfig;
use crate::error::UploadError;
use crate::types::{ApiResponse, UploadFile};

/// Multipart field the service reads the document from.
const FILE_FIELD: &str = "file";

/// Transport seam between the upload workflow and the extraction service.
pub trait ExtractionService: Send + Sync {
    /// Send one document and return the decoded envelope. Non-2xx statuses,
    /// connection failures and undecodable bodies come back as errors.
    fn parse_pdf(
        &self,
        file: &UploadFile,
    ) -> impl Future<Output = Result<ApiResponse, UploadError>> + Send;
}

pub struct ServiceClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ServiceClient {
    /// Create new service client with configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(seconds));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.parse_pdf_url(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, file: &UploadFile) -> Result<ApiResponse, UploadError> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())
            .map_err(|e| UploadError::connection(format!("Failed to create multipart: {}", e)))?;
        let form = Form::new().part(FILE_FIELD, part);

        info!(
            "Calling extraction service: {} ({}, {} bytes)",
            self.endpoint,
            file.name(),
            file.size()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Extraction request failed: {}", e);
                UploadError::connection(e.to_string())
            })?;

        let status = response.status();
        trace!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Extraction service error response {}: {}", status, error_text);
            return Err(UploadError::status(status.as_u16()));
        }

        let response_text = response.text().await.map_err(|e| {
            error!("Failed to read extraction response body: {}", e);
            UploadError::connection(e.to_string())
        })?;

        serde_json::from_str::<ApiResponse>(&response_text).map_err(|e| {
            error!(
                "Failed to parse extraction response: {}. Raw response: {}",
                e, response_text
            );
            UploadError::MalformedResponse(e.to_string())
        })
    }
}

impl ExtractionService for ServiceClient {
    fn parse_pdf(
        &self,
        file: &UploadFile,
    ) -> impl Future<Output = Result<ApiResponse, UploadError>> + Send {
        self.send(file)
    }
}
