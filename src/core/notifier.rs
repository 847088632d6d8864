// src/core/notifier.rs
//! Result notifications ("toasts"), decoupled from the workflow through [`Notifier`].

use std::fmt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::UploadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(file_name: &str) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "PDF Parsed Successfully!".to_string(),
            description: format!("Extracted information from {}", file_name),
        }
    }

    pub fn failure(error: &UploadError) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: error.title().to_string(),
            description: error.to_string(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NotificationLevel::Success => "✓",
            NotificationLevel::Error => "✗",
        };
        write!(f, "{} {}: {}", marker, self.title, self.description)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing pipeline only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!("{}", notification),
            NotificationLevel::Error => warn!("{}", notification),
        }
    }
}

/// Logs, then forwards notifications to a receiver owned by the presentation layer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        LogNotifier.notify(notification.clone());
        if self.tx.send(notification).is_err() {
            warn!("Notification dropped: receiver closed");
        }
    }
}
