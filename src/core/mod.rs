// src/core/mod.rs
//! Upload workflow: transport, notifications and the state machine driving them

pub mod controller;
pub mod notifier;
pub mod service_client;

pub use controller::{SubmitOutcome, UploadController, UploadPhase, UploadState};
pub use notifier::{ChannelNotifier, LogNotifier, Notification, NotificationLevel, Notifier};
pub use service_client::{ExtractionService, ServiceClient};
