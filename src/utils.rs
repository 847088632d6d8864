// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;

/// Strip any directory components from a client-supplied file name
pub fn file_name_only(name: &str) -> String {
    let last = name.rsplit(&['/', '\\'][..]).next().unwrap_or("").trim();
    match last {
        "" | "." | ".." => "download.pdf".to_string(),
        other => other.to_string(),
    }
}

/// Human readable size in megabytes with two decimals
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

// File system utilities
pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}
