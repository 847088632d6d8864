// src/core/controller.rs
//! Upload workflow state machine

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::notifier::{Notification, Notifier};
use crate::core::service_client::ExtractionService;
use crate::error::{UploadError, ValidationError};
use crate::pdf_validator::PdfValidator;
use crate::types::{Extraction, UploadFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
    Success,
    Error,
}

/// Workflow state. Each variant carries exactly the data valid in that phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle {
        /// Set when the latest selection was refused by validation.
        rejection: Option<ValidationError>,
    },
    Uploading {
        submission: Uuid,
        file: UploadFile,
    },
    Success {
        file: UploadFile,
        extraction: Extraction,
    },
    Error {
        file: UploadFile,
        error: UploadError,
    },
}

impl Default for UploadState {
    fn default() -> Self {
        Self::Idle { rejection: None }
    }
}

impl UploadState {
    pub fn phase(&self) -> UploadPhase {
        match self {
            Self::Idle { .. } => UploadPhase::Idle,
            Self::Uploading { .. } => UploadPhase::Uploading,
            Self::Success { .. } => UploadPhase::Success,
            Self::Error { .. } => UploadPhase::Error,
        }
    }

    pub fn file(&self) -> Option<&UploadFile> {
        match self {
            Self::Idle { .. } => None,
            Self::Uploading { file, .. } | Self::Success { file, .. } | Self::Error { file, .. } => {
                Some(file)
            }
        }
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        match self {
            Self::Success { extraction, .. } => Some(extraction),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&UploadError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// What a `submit` or `retry` call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The file failed validation; no request was sent.
    Rejected(ValidationError),
    /// The controller was not accepting files in this phase; nothing happened.
    Ignored(UploadPhase),
    /// The request settled and the controller moved to `Success` or `Error`.
    Settled(UploadPhase),
    /// The request settled after the controller had moved on; the response was dropped.
    Superseded,
}

pub struct UploadController<S, N> {
    service: S,
    notifier: N,
    state: watch::Sender<UploadState>,
}

impl<S, N> UploadController<S, N>
where
    S: ExtractionService,
    N: Notifier,
{
    pub fn new(service: S, notifier: N) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            service,
            notifier,
            state,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> UploadPhase {
        self.state.borrow().phase()
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Validate `file` and, if accepted, send it for extraction.
    pub async fn submit(&self, file: UploadFile) -> SubmitOutcome {
        self.submit_selection(vec![file]).await
    }

    /// Validate a selection, which must hold exactly one PDF, and send it for
    /// extraction.
    ///
    /// Accepted from `Idle` and `Error`. While `Uploading` or `Success` the call
    /// is a no-op. Every attempt that is not ignored emits exactly one
    /// notification.
    pub async fn submit_selection(&self, files: Vec<UploadFile>) -> SubmitOutcome {
        let submission = Uuid::new_v4();
        let selected = files.len();
        let mut outcome = None;
        let mut accepted = None;

        self.state.send_if_modified(|state| match state.phase() {
            phase @ (UploadPhase::Uploading | UploadPhase::Success) => {
                outcome = Some(SubmitOutcome::Ignored(phase));
                false
            }
            phase @ (UploadPhase::Idle | UploadPhase::Error) => {
                match PdfValidator::validate_selection(files) {
                    Err(rejection) => {
                        outcome = Some(SubmitOutcome::Rejected(rejection.clone()));
                        if phase == UploadPhase::Idle {
                            *state = UploadState::Idle {
                                rejection: Some(rejection),
                            };
                            true
                        } else {
                            false
                        }
                    }
                    Ok(file) => {
                        *state = UploadState::Uploading {
                            submission,
                            file: file.clone(),
                        };
                        accepted = Some(file);
                        true
                    }
                }
            }
        });

        match (accepted, outcome) {
            (Some(file), _) => self.run(submission, file).await,
            (None, Some(SubmitOutcome::Rejected(rejection))) => {
                self.notifier
                    .notify(Notification::failure(&UploadError::Validation(rejection.clone())));
                SubmitOutcome::Rejected(rejection)
            }
            (None, Some(ignored)) => {
                warn!("Ignoring selection of {} file(s): {:?}", selected, ignored);
                ignored
            }
            (None, None) => SubmitOutcome::Ignored(self.phase()),
        }
    }

    /// Re-send the file held by the `Error` state.
    pub async fn retry(&self) -> SubmitOutcome {
        let submission = Uuid::new_v4();
        let mut retried = None;

        self.state.send_if_modified(|state| match state {
            UploadState::Error { file, .. } => {
                let file = file.clone();
                retried = Some(file.clone());
                *state = UploadState::Uploading { submission, file };
                true
            }
            _ => false,
        });

        match retried {
            Some(file) => {
                info!("Retrying extraction for {}", file.name());
                self.run(submission, file).await
            }
            None => SubmitOutcome::Ignored(self.phase()),
        }
    }

    /// Discard the held file and result and return to `Idle`.
    ///
    /// Returns `false` while a request is in flight; there is no cancellation.
    pub fn new_upload(&self) -> bool {
        let mut reset = false;
        self.state.send_if_modified(|state| match state {
            UploadState::Uploading { .. } => false,
            UploadState::Idle { rejection: None } => {
                reset = true;
                false
            }
            _ => {
                *state = UploadState::default();
                reset = true;
                true
            }
        });
        if reset {
            info!("Workflow reset for a new upload");
        }
        reset
    }

    /// Save the held original file into `dir`. No network access is involved.
    pub async fn save_original(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let file = self.state.borrow().file().cloned();
        match file {
            Some(file) => {
                let saved = file.save_to(dir).await?;
                info!("Saved original {} to {}", file.name(), saved.display());
                Ok(Some(saved))
            }
            None => Ok(None),
        }
    }

    async fn run(&self, submission: Uuid, file: UploadFile) -> SubmitOutcome {
        info!("Submitting {} ({} bytes) [{}]", file.name(), file.size(), submission);

        let result = self
            .service
            .parse_pdf(&file)
            .await
            .and_then(|response| response.into_extraction());

        let notification = match &result {
            Ok(_) => Notification::success(file.name()),
            Err(error) => Notification::failure(error),
        };
        let next = match result {
            Ok(extraction) => UploadState::Success { file, extraction },
            Err(error) => {
                warn!("Extraction failed [{}]: {}", submission, error);
                UploadState::Error { file, error }
            }
        };
        let phase = next.phase();

        let applied = self.state.send_if_modified(|state| match state {
            UploadState::Uploading { submission: current, .. } if *current == submission => {
                *state = next;
                true
            }
            _ => false,
        });

        if !applied {
            warn!("Dropping stale response for submission {}", submission);
            return SubmitOutcome::Superseded;
        }

        self.notifier.notify(notification);
        SubmitOutcome::Settled(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notifier::{ChannelNotifier, NotificationLevel};
    use crate::error::ErrorKind;
    use crate::render::{extracted_field_count, format_deadline};
    use crate::types::{ApiResponse, ExtractionResult, ExtractionSummary};
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::{mpsc, Notify};

    #[derive(Clone)]
    struct FakeService {
        calls: Arc<AtomicUsize>,
        reply: Result<ApiResponse, UploadError>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeService {
        fn replying(reply: Result<ApiResponse, UploadError>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                reply,
                gate: None,
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ExtractionService for FakeService {
        fn parse_pdf(
            &self,
            _file: &UploadFile,
        ) -> impl Future<Output = Result<ApiResponse, UploadError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            let gate = self.gate.clone();
            async move {
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                reply
            }
        }
    }

    type Controller = UploadController<FakeService, ChannelNotifier>;

    fn controller(service: FakeService) -> (Controller, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, rx) = ChannelNotifier::channel();
        (UploadController::new(service, notifier), rx)
    }

    fn pdf(name: &str, size: usize) -> UploadFile {
        UploadFile::new(name, "application/pdf", vec![b'%'; size])
    }

    fn notice_response() -> ApiResponse {
        let data = ExtractionResult {
            job_title: Some("Clerk".into()),
            vacancies: Some("10".into()),
            salary: Some("35000".into()),
            application_deadline: Some("2025-01-10".into()),
            application_url: Some("https://jobs.gov/apply".into()),
            ..Default::default()
        };
        let summary = ExtractionSummary {
            file_name: "notice.pdf".into(),
            file_size_bytes: 2_097_152,
            text_length: 4032,
            extracted_fields: BTreeMap::from([
                ("job_title".to_string(), true),
                ("department".to_string(), false),
                ("vacancies".to_string(), true),
                ("eligibility".to_string(), false),
                ("salary".to_string(), true),
                ("application_deadline".to_string(), true),
                ("application_url".to_string(), true),
            ]),
            parsing_timestamp: "2025-01-01T10:00:00Z".into(),
        };
        ApiResponse::success(data, summary)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
        let mut all = Vec::new();
        while let Ok(n) = rx.try_recv() {
            all.push(n);
        }
        all
    }

    #[tokio::test]
    async fn test_notice_scenario_reaches_success_then_resets() {
        let service = FakeService::replying(Ok(notice_response()));
        let (controller, mut rx) = controller(service.clone());

        let outcome = controller.submit(pdf("notice.pdf", 2 * 1024 * 1024)).await;
        assert_eq!(outcome, SubmitOutcome::Settled(UploadPhase::Success));
        assert_eq!(service.calls(), 1);

        let state = controller.state();
        let extraction = state.extraction().unwrap();
        assert_eq!(extracted_field_count(&extraction.extraction_summary), 5);
        assert_eq!(
            format_deadline(extraction.data.application_deadline.as_deref()),
            "10 January 2025"
        );

        let notes = drain(&mut rx);
        assert_eq!(notes, vec![Notification::success("notice.pdf")]);

        assert!(controller.new_upload());
        assert_eq!(controller.state(), UploadState::Idle { rejection: None });
        assert!(controller.state().file().is_none());
    }

    #[tokio::test]
    async fn test_oversized_pdf_is_rejected_without_request() {
        let service = FakeService::replying(Ok(notice_response()));
        let (controller, mut rx) = controller(service.clone());

        let outcome = controller.submit(pdf("big.pdf", 15 * 1024 * 1024)).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(ValidationError::TooLarge { .. })
        ));
        assert_eq!(service.calls(), 0);
        assert!(matches!(
            controller.state(),
            UploadState::Idle {
                rejection: Some(ValidationError::TooLarge { .. })
            }
        ));

        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Invalid File");
    }

    #[tokio::test]
    async fn test_non_pdf_is_rejected_without_request() {
        let service = FakeService::replying(Ok(notice_response()));
        let (controller, _rx) = controller(service.clone());

        let file = UploadFile::new("photo.png", "image/png", vec![1, 2, 3]);
        let outcome = controller.submit(file).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(service.calls(), 0);
        assert_eq!(controller.phase(), UploadPhase::Idle);
    }

    #[tokio::test]
    async fn test_selection_must_hold_one_file() {
        let service = FakeService::replying(Ok(notice_response()));
        let (controller, mut rx) = controller(service.clone());

        let outcome = controller
            .submit_selection(vec![pdf("a.pdf", 10), pdf("b.pdf", 10)])
            .await;
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(ValidationError::TooManyFiles { count: 2 })
        );
        assert_eq!(
            controller.submit_selection(vec![]).await,
            SubmitOutcome::Rejected(ValidationError::NoFile)
        );
        assert_eq!(service.calls(), 0);
        assert_eq!(
            controller.state(),
            UploadState::Idle {
                rejection: Some(ValidationError::NoFile)
            }
        );
        assert_eq!(drain(&mut rx).len(), 2);

        let outcome = controller.submit_selection(vec![pdf("notice.pdf", 10)]).await;
        assert_eq!(outcome, SubmitOutcome::Settled(UploadPhase::Success));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_while_uploading_is_noop() {
        let gate = Arc::new(Notify::new());
        let service = FakeService::replying(Ok(notice_response())).gated(gate.clone());
        let (controller, mut rx) = controller(service.clone());
        let controller = Arc::new(controller);

        let mut states = controller.subscribe();
        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit(pdf("notice.pdf", 64)).await })
        };
        states
            .wait_for(|s| s.phase() == UploadPhase::Uploading)
            .await
            .unwrap();

        let second = controller.submit(pdf("other.pdf", 64)).await;
        assert_eq!(second, SubmitOutcome::Ignored(UploadPhase::Uploading));
        assert_eq!(controller.retry().await, SubmitOutcome::Ignored(UploadPhase::Uploading));
        assert!(!controller.new_upload());

        gate.notify_one();
        assert_eq!(
            first.await.unwrap(),
            SubmitOutcome::Settled(UploadPhase::Success)
        );
        assert_eq!(service.calls(), 1);
        assert_eq!(drain(&mut rx).len(), 1);
        assert_eq!(
            controller.state().file().map(|f| f.name().to_string()),
            Some("notice.pdf".to_string())
        );
    }

    #[tokio::test]
    async fn test_server_error_then_retry_same_file() {
        let service = FakeService::replying(Err(UploadError::status(500)));
        let (controller, mut rx) = controller(service.clone());
        let file = pdf("notice.pdf", 128);

        let outcome = controller.submit(file.clone()).await;
        assert_eq!(outcome, SubmitOutcome::Settled(UploadPhase::Error));
        let state = controller.state();
        assert_eq!(state.error().unwrap().kind(), ErrorKind::Transport);
        assert_eq!(state.file(), Some(&file));

        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].description, "HTTP error! status: 500");

        let outcome = controller.retry().await;
        assert_eq!(outcome, SubmitOutcome::Settled(UploadPhase::Error));
        assert_eq!(service.calls(), 2);
        assert_eq!(controller.state().file(), Some(&file));
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_logical_failure_goes_to_error() {
        let service = FakeService::replying(Ok(ApiResponse::failure("Could not read PDF")));
        let (controller, mut rx) = controller(service);

        controller.submit(pdf("notice.pdf", 10)).await;
        assert_eq!(
            controller.state().error(),
            Some(&UploadError::Logical("Could not read PDF".into()))
        );
        assert_eq!(drain(&mut rx)[0].description, "Could not read PDF");
    }

    #[tokio::test]
    async fn test_invariant_violations_never_reach_success() {
        let malformed = [
            ApiResponse {
                success: false,
                data: None,
                error: None,
                extraction_summary: None,
            },
            ApiResponse {
                success: true,
                data: None,
                error: None,
                extraction_summary: notice_response().extraction_summary,
            },
            ApiResponse {
                success: true,
                data: notice_response().data,
                error: None,
                extraction_summary: None,
            },
        ];

        for response in malformed {
            let (controller, _rx) = controller(FakeService::replying(Ok(response)));
            let outcome = controller.submit(pdf("notice.pdf", 10)).await;
            assert_eq!(outcome, SubmitOutcome::Settled(UploadPhase::Error));
            assert_eq!(
                controller.state().error().unwrap().kind(),
                ErrorKind::MalformedResponse
            );
        }
    }

    #[tokio::test]
    async fn test_success_ignores_new_files_until_reset() {
        let service = FakeService::replying(Ok(notice_response()));
        let (controller, _rx) = controller(service.clone());

        controller.submit(pdf("notice.pdf", 10)).await;
        let outcome = controller.submit(pdf("second.pdf", 10)).await;
        assert_eq!(outcome, SubmitOutcome::Ignored(UploadPhase::Success));
        assert_eq!(service.calls(), 1);

        controller.new_upload();
        controller.submit(pdf("second.pdf", 10)).await;
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn test_error_accepts_a_different_file() {
        let service = FakeService::replying(Err(UploadError::connection("refused")));
        let (controller, _rx) = controller(service.clone());

        controller.submit(pdf("first.pdf", 10)).await;
        assert_eq!(controller.phase(), UploadPhase::Error);

        let outcome = controller
            .submit(UploadFile::new("notes.txt", "text/plain", vec![1]))
            .await;
        assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
        assert_eq!(controller.phase(), UploadPhase::Error);

        controller.submit(pdf("second.pdf", 10)).await;
        assert_eq!(service.calls(), 2);
        assert_eq!(controller.state().file().unwrap().name(), "second.pdf");
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let gate = Arc::new(Notify::new());
        let service = FakeService::replying(Ok(notice_response())).gated(gate.clone());
        let (controller, mut rx) = controller(service);
        let controller = Arc::new(controller);

        let mut states = controller.subscribe();
        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit(pdf("notice.pdf", 10)).await })
        };
        states
            .wait_for(|s| s.phase() == UploadPhase::Uploading)
            .await
            .unwrap();

        // Simulate a superseding submission taking over the in-flight slot.
        controller.state.send_replace(UploadState::Uploading {
            submission: Uuid::new_v4(),
            file: pdf("newer.pdf", 10),
        });

        gate.notify_one();
        assert_eq!(pending.await.unwrap(), SubmitOutcome::Superseded);
        assert_eq!(controller.phase(), UploadPhase::Uploading);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_retry_outside_error_is_ignored() {
        let service = FakeService::replying(Ok(notice_response()));
        let (controller, _rx) = controller(service.clone());
        assert_eq!(controller.retry().await, SubmitOutcome::Ignored(UploadPhase::Idle));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_save_original_after_success() {
        let (controller, _rx) = controller(FakeService::replying(Ok(notice_response())));
        let dir = std::env::temp_dir().join(format!("job_notice_ctrl_{}", Uuid::new_v4()));

        assert_eq!(controller.save_original(&dir).await.unwrap(), None);

        controller.submit(pdf("notice.pdf", 32)).await;
        let saved = controller.save_original(&dir).await.unwrap().unwrap();
        assert_eq!(saved, dir.join("notice.pdf"));
        assert_eq!(tokio::fs::read(&saved).await.unwrap().len(), 32);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
