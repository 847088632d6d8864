// src/cli.rs
//! Terminal session driving the upload workflow

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::config::ClientConfig;
use crate::core::{
    ChannelNotifier, ExtractionService, Notification, Notifier, ServiceClient, SubmitOutcome,
    UploadController, UploadPhase, UploadState,
};
use crate::render::{JobCard, SummaryPanel};
use crate::types::UploadFile;

#[derive(Parser, Debug)]
#[command(name = "job-notice")]
#[command(about = "Extract the key details of a government job notification PDF")]
pub struct Cli {
    /// PDF file to submit (exactly one)
    pub files: Vec<PathBuf>,

    /// Extraction service base URL (overrides job-notice.yaml and PDF_PARSER_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Save a copy of the submitted file into this directory
    #[arg(long)]
    pub save_copy: Option<PathBuf>,

    /// Print the extraction as JSON instead of a job card
    #[arg(long)]
    pub json: bool,

    /// Exit after the first result instead of prompting for more actions
    #[arg(long)]
    pub no_interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Retry,
    New(PathBuf),
    Download(PathBuf),
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match (command.to_lowercase().as_str(), argument) {
            ("retry" | "r", "") => Ok(Self::Retry),
            ("new" | "n", "") => Err("Usage: new <path-to-pdf>".to_string()),
            ("new" | "n", path) => Ok(Self::New(PathBuf::from(path))),
            ("download" | "d", "") => Ok(Self::Download(PathBuf::from("."))),
            ("download" | "d", dir) => Ok(Self::Download(PathBuf::from(dir))),
            ("help" | "h" | "?", _) => Ok(Self::Help),
            ("quit" | "q" | "exit", _) => Ok(Self::Quit),
            ("", _) => Err(String::new()),
            (other, _) => Err(format!("Unknown command: {} (type `help`)", other)),
        }
    }
}

const SESSION_HELP: &str = "Commands:
  retry            re-submit the same file after a failure
  new <path>       start over with another PDF
  download [dir]   save the original file (default: current directory)
  quit             leave";

pub async fn handle_cli(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load()?;
    if let Some(api_url) = cli.api_url.clone() {
        config = config.with_base_url(api_url);
    }
    if let Some(timeout) = cli.timeout {
        config = config.with_timeout_seconds(timeout);
    }
    let config = config.validated()?;
    info!("Extraction service: {}", config.parse_pdf_url());

    let client = ServiceClient::new(&config)?;
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let controller = UploadController::new(client, notifier);

    submit_paths(&controller, &cli.files).await?;
    report(&controller, &mut notifications, cli.json)?;

    if let Some(dir) = &cli.save_copy {
        save_copy(&controller, dir).await?;
    }

    if !cli.no_interactive {
        run_session(&controller, &mut notifications, cli.json).await?;
    }

    match controller.state() {
        UploadState::Error { error, .. } => anyhow::bail!("Extraction failed: {}", error),
        UploadState::Idle {
            rejection: Some(rejection),
        } => anyhow::bail!("File rejected: {}", rejection),
        _ => Ok(()),
    }
}

async fn run_session<S, N>(
    controller: &UploadController<S, N>,
    notifications: &mut UnboundedReceiver<Notification>,
    json: bool,
) -> Result<()>
where
    S: ExtractionService,
    N: Notifier,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(controller.phase())?;

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        match SessionCommand::parse(&line) {
            Ok(SessionCommand::Quit) => break,
            Ok(SessionCommand::Help) => println!("{}", SESSION_HELP),
            Ok(SessionCommand::Retry) => {
                if let SubmitOutcome::Ignored(phase) = controller.retry().await {
                    println!("Nothing to retry ({:?})", phase);
                }
                report(controller, notifications, json)?;
            }
            Ok(SessionCommand::New(path)) => {
                controller.new_upload();
                if let Err(e) = submit_paths(controller, &[path]).await {
                    println!("✗ {:#}", e);
                }
                report(controller, notifications, json)?;
            }
            Ok(SessionCommand::Download(dir)) => {
                if let Err(e) = save_copy(controller, &dir).await {
                    println!("✗ {:#}", e);
                }
            }
            Err(message) if message.is_empty() => {}
            Err(message) => println!("{}", message),
        }
        prompt(controller.phase())?;
    }

    Ok(())
}

async fn submit_paths<S, N>(
    controller: &UploadController<S, N>,
    paths: &[PathBuf],
) -> Result<SubmitOutcome>
where
    S: ExtractionService,
    N: Notifier,
{
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(path).await?);
    }
    if let [file] = files.as_slice() {
        println!("Processing {}...", file.name());
    }
    Ok(controller.submit_selection(files).await)
}

async fn save_copy<S, N>(controller: &UploadController<S, N>, dir: &Path) -> Result<()>
where
    S: ExtractionService,
    N: Notifier,
{
    match controller.save_original(dir).await? {
        Some(path) => println!("Saved original to {}", path.display()),
        None => println!("No file to save"),
    }
    Ok(())
}

fn report<S, N>(
    controller: &UploadController<S, N>,
    notifications: &mut UnboundedReceiver<Notification>,
    json: bool,
) -> Result<()>
where
    S: ExtractionService,
    N: Notifier,
{
    while let Ok(notification) = notifications.try_recv() {
        eprintln!("{}", notification);
    }
    if let Some(text) = render_state(&controller.state(), json, Utc::now())? {
        println!("{}", text);
    }
    Ok(())
}

fn prompt(phase: UploadPhase) -> Result<()> {
    let hint = match phase {
        UploadPhase::Success => "new <file> | download [dir] | quit",
        UploadPhase::Error => "retry | new <file> | download [dir] | quit",
        _ => "new <file> | quit",
    };
    print!("[{}] > ", hint);
    std::io::stdout().flush().context("Failed to flush stdout")
}

/// Text shown for a workflow state, if any.
pub fn render_state(state: &UploadState, json: bool, now: DateTime<Utc>) -> Result<Option<String>> {
    let text = match state {
        UploadState::Idle { rejection: None } | UploadState::Uploading { .. } => return Ok(None),
        UploadState::Idle {
            rejection: Some(rejection),
        } => format!("File rejected [{}]: {}", rejection.code(), rejection),
        UploadState::Success { extraction, .. } if json => serde_json::to_string_pretty(extraction)
            .context("Failed to serialize extraction")?,
        UploadState::Success { extraction, .. } => format!(
            "Extraction Results\nSuccessfully parsed job notification from {}\n\n{}\n\n{}",
            extraction.extraction_summary.file_name,
            JobCard::from_extraction(extraction, now),
            SummaryPanel::new(&extraction.extraction_summary)
        ),
        UploadState::Error { file, error } => {
            format!("Extraction of {} failed: {}", file.name(), error)
        }
    };
    Ok(Some(text))
}
