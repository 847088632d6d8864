// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_CONFIG_FILE: &str = "job-notice.yaml";
const PARSE_PDF_PATH: &str = "/parse-pdf";

/// Where the extraction service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` leaves the transport default in place.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigSection {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<ConfigSection>,
    #[serde(default)]
    production: Option<ConfigSection>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the optional YAML file and the process environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading client configuration for environment: {}", environment);

        let config_path = std::env::var("JOB_NOTICE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let file_contents = if config_path.exists() {
            Some(
                std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(file_contents.as_deref(), &environment, |key| {
            std::env::var(key).ok()
        })
    }

    fn get_environment() -> String {
        std::env::var("JOB_NOTICE_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Layer defaults, the YAML section for `environment`, then environment
    /// variables looked up through `env`.
    pub fn from_sources<F>(file_contents: Option<&str>, environment: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(contents) = file_contents {
            let file: ConfigFile =
                serde_yaml::from_str(contents).context("Failed to parse client configuration")?;
            let section = match environment {
                "production" => file.production,
                _ => file.local,
            };
            if let Some(section) = section {
                if let Some(base_url) = section.base_url {
                    config.base_url = base_url;
                }
                if section.timeout_seconds.is_some() {
                    config.timeout_seconds = section.timeout_seconds;
                }
            }
        }

        if let Some(base_url) = env("PDF_PARSER_API_URL") {
            config.base_url = base_url;
        }
        if let Some(timeout) = env("PDF_PARSER_TIMEOUT_SECS") {
            let seconds = timeout
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("PDF_PARSER_TIMEOUT_SECS must be a number of seconds"))?;
            config.timeout_seconds = Some(seconds);
        }

        config.validated()
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Trim the base URL and make sure it is an absolute http(s) URL.
    pub fn validated(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            anyhow::bail!("Extraction service base URL is empty");
        }

        let parsed = url::Url::parse(&trimmed)
            .with_context(|| format!("Invalid extraction service URL: {}", trimmed))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!(
                "Extraction service URL must use http or https, got: {}",
                parsed.scheme()
            );
        }

        if self.timeout_seconds == Some(0) {
            anyhow::bail!("Timeout must be at least one second");
        }

        self.base_url = trimmed;
        Ok(self)
    }

    pub fn parse_pdf_url(&self) -> String {
        format!("{}{}", self.base_url, PARSE_PDF_PATH)
    }
}
