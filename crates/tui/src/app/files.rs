//! File management: bulk upload of a delimited file.
use std::sync::Arc;

use api_types::file::{BulkPurpose, ProcessBulkUploadResponse};
use engine::{FileBackend, UploadError, UploadFile, UploadOrchestrator, UploadState};
use tokio::{sync::watch, task::JoinHandle};

type Run = JoinHandle<(UploadOrchestrator, Result<ProcessBulkUploadResponse, UploadError>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFocus {
    Path,
    Purpose,
    Confirm,
}

impl FileFocus {
    fn next(self) -> Self {
        match self {
            Self::Path => Self::Purpose,
            Self::Purpose => Self::Confirm,
            Self::Confirm => Self::Path,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Path => Self::Confirm,
            Self::Purpose => Self::Path,
            Self::Confirm => Self::Purpose,
        }
    }
}

/// How a finished run ended, for the toast.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Queued,
    Previewed,
    Failed(String),
}

pub struct FileScreen {
    pub path: String,
    pub focus: FileFocus,
    pub confirm: bool,
    purpose: usize,
    state: watch::Receiver<UploadState>,
    orchestrator: Option<UploadOrchestrator>,
    running: Option<Run>,
    object_key: Option<String>,
    columns: Vec<String>,
}

impl FileScreen {
    pub fn new(backend: Arc<dyn FileBackend>) -> Self {
        let orchestrator = UploadOrchestrator::new(backend);
        Self {
            path: String::new(),
            focus: FileFocus::Path,
            confirm: true,
            purpose: 0,
            state: orchestrator.subscribe(),
            orchestrator: Some(orchestrator),
            running: None,
            object_key: None,
            columns: Vec::new(),
        }
    }

    pub fn purpose(&self) -> BulkPurpose {
        BulkPurpose::ALL[self.purpose % BulkPurpose::ALL.len()]
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Storage key of the last finalized file; kept after a processing failure.
    pub fn object_key(&self) -> Option<&str> {
        self.object_key.as_deref()
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn type_char(&mut self, ch: char) {
        if self.focus == FileFocus::Path && !self.is_running() {
            self.path.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if self.focus == FileFocus::Path && !self.is_running() {
            self.path.pop();
        }
    }

    /// Left/Right and Space on the purpose and confirm fields.
    pub fn cycle(&mut self, forward: bool) {
        if self.is_running() {
            return;
        }
        match self.focus {
            FileFocus::Purpose => {
                let len = BulkPurpose::ALL.len();
                self.purpose = if forward {
                    (self.purpose + 1) % len
                } else {
                    (self.purpose + len - 1) % len
                };
            }
            FileFocus::Confirm => self.confirm = !self.confirm,
            FileFocus::Path => {}
        }
    }

    /// Starts the whole flow in the background.
    pub fn start(&mut self) -> Result<(), UploadError> {
        if self.is_running() {
            return Err(UploadError::InvalidTransition {
                attempted: "start an upload",
                current: "running",
            });
        }
        let path = self.path.trim().to_string();
        if path.is_empty() {
            return Err(UploadError::Read("enter a file path".to_string()));
        }
        let state = self.state();
        if state != UploadState::Idle {
            return Err(UploadError::InvalidTransition {
                attempted: "start an upload",
                current: state.label(),
            });
        }
        let Some(mut orchestrator) = self.orchestrator.take() else {
            return Err(UploadError::InvalidTransition {
                attempted: "start an upload",
                current: "running",
            });
        };

        let purpose = self.purpose();
        let confirm = self.confirm;
        tracing::info!(%path, ?purpose, confirm, "starting bulk upload");
        self.running = Some(tokio::spawn(async move {
            let result = match UploadFile::read(&path).await {
                Ok(file) => orchestrator.run(file, purpose, confirm).await,
                Err(err) => Err(err),
            };
            (orchestrator, result)
        }));
        Ok(())
    }

    /// Collects a finished run; `None` while still running or idle.
    pub async fn poll(&mut self) -> Option<FileOutcome> {
        if !self.running.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        let handle = self.running.take()?;
        match handle.await {
            Ok((orchestrator, result)) => {
                self.columns = orchestrator.columns().to_vec();
                self.object_key = orchestrator
                    .finalized()
                    .map(|finalized| finalized.object_key.clone());
                self.orchestrator = Some(orchestrator);
                Some(match result {
                    Ok(processed) if processed.queued => FileOutcome::Queued,
                    Ok(_) => FileOutcome::Previewed,
                    Err(err) => FileOutcome::Failed(err.to_string()),
                })
            }
            Err(err) => {
                tracing::error!("upload task ended abnormally: {err}");
                Some(FileOutcome::Failed("upload stopped unexpectedly".to_string()))
            }
        }
    }

    /// Back to idle for a new file; ignored while a run is in flight.
    pub fn reset(&mut self) -> bool {
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            return false;
        };
        orchestrator.reset();
        self.columns.clear();
        self.object_key = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::PathBuf};

    use api_types::file::{
        FileIntentRequest, FileIntentResponse, FinalizeFileResponse, ProcessBulkUploadRequest,
    };
    use async_trait::async_trait;
    use engine::{RemoteError, upload::ProgressFn};

    use super::*;

    struct Storage {
        fail_process: bool,
    }

    #[async_trait]
    impl FileBackend for Storage {
        async fn create_intent(
            &self,
            _request: &FileIntentRequest,
        ) -> Result<FileIntentResponse, RemoteError> {
            Ok(FileIntentResponse {
                upload_url: "https://storage.test/put".to_string(),
                file_id: "f-9".to_string(),
            })
        }

        async fn upload(
            &self,
            _upload_url: &str,
            _content_type: &str,
            bytes: Vec<u8>,
            progress: ProgressFn,
        ) -> Result<(), RemoteError> {
            progress(bytes.len() as u64, bytes.len() as u64);
            Ok(())
        }

        async fn finalize(&self, file_id: &str) -> Result<FinalizeFileResponse, RemoteError> {
            Ok(FinalizeFileResponse {
                status: "finalized".to_string(),
                object_key: format!("uploads/{file_id}.csv"),
                public_url: None,
            })
        }

        async fn process(
            &self,
            request: &ProcessBulkUploadRequest,
        ) -> Result<ProcessBulkUploadResponse, RemoteError> {
            if self.fail_process {
                return Err(RemoteError::Server("queue unavailable".to_string()));
            }
            Ok(ProcessBulkUploadResponse {
                queued: request.confirm,
                preview: None,
                job: None,
            })
        }
    }

    fn csv_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("billdesk-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"account_number,amount\n0101234567,1500\n")
            .unwrap();
        path
    }

    async fn finish(screen: &mut FileScreen) -> FileOutcome {
        loop {
            if let Some(outcome) = screen.poll().await {
                return outcome;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn confirmed_upload_is_queued() {
        let path = csv_file("queued.csv");
        let mut screen = FileScreen::new(Arc::new(Storage {
            fail_process: false,
        }));
        screen.path = path.display().to_string();
        screen.start().unwrap();
        assert!(screen.is_running());
        assert!(screen.start().is_err());

        assert_eq!(finish(&mut screen).await, FileOutcome::Queued);
        assert_eq!(screen.state(), UploadState::Processed { queued: true });
        assert_eq!(screen.columns(), ["account_number", "amount"]);
        assert!(screen.start().is_err());

        assert!(screen.reset());
        assert_eq!(screen.state(), UploadState::Idle);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn processing_failure_keeps_object_key() {
        let path = csv_file("failing.csv");
        let mut screen = FileScreen::new(Arc::new(Storage { fail_process: true }));
        screen.path = path.display().to_string();
        screen.start().unwrap();

        let FileOutcome::Failed(message) = finish(&mut screen).await else {
            panic!("processing should fail");
        };
        assert_eq!(message, "processing failed: queue unavailable");
        assert_eq!(screen.object_key(), Some("uploads/f-9.csv"));
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn unsupported_file_fails_before_any_request() {
        let mut screen = FileScreen::new(Arc::new(Storage {
            fail_process: false,
        }));
        screen.path = "/tmp/report.pdf".to_string();
        screen.start().unwrap();
        assert!(matches!(finish(&mut screen).await, FileOutcome::Failed(_)));
        assert_eq!(screen.state(), UploadState::Idle);
    }

    #[test]
    fn purpose_and_confirm_cycle() {
        let mut screen = FileScreen::new(Arc::new(Storage {
            fail_process: false,
        }));
        screen.type_char('a');
        screen.focus_next();
        screen.type_char('b');
        assert_eq!(screen.path, "a");

        screen.cycle(false);
        assert_eq!(screen.purpose(), BulkPurpose::Payments);
        screen.focus_next();
        screen.cycle(true);
        assert!(!screen.confirm);
    }
}
