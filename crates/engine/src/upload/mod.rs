//! Bulk file upload orchestration.
//!
//! Four strictly sequential steps hand a local file over to the backend:
//!
//! 1. read the header row into a column list,
//! 2. ask the backend for an upload intent (signed URL + file id),
//! 3. PUT the raw bytes to the signed URL,
//! 4. finalize the file, then ask for bulk processing.
//!
//! ```text
//! Idle → ColumnsExtracted → IntentCreated → Uploading(%) → Finalized → Processed
//!   └──────────────┴───────────────┴──────────────┴────────────┴──→ Failed{stage}
//! ```
//!
//! `Failed` is absorbing until [`UploadOrchestrator::reset`]. Completed steps
//! are never rolled back: a processing failure leaves the file finalized on the
//! server and [`UploadOrchestrator::finalized`] still reports it.
use std::sync::Arc;

use api_types::file::{
    BulkPurpose, FileIntentRequest, FileIntentResponse, FinalizeFileResponse,
    ProcessBulkUploadRequest, ProcessBulkUploadResponse,
};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::error::RemoteError;

mod file;

pub use file::{FileFormat, UploadFile};

/// Byte progress callback: `(sent, total)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Storage/processing backend the orchestrator talks to.
#[async_trait]
pub trait FileBackend: Send + Sync {
    async fn create_intent(
        &self,
        request: &FileIntentRequest,
    ) -> Result<FileIntentResponse, RemoteError>;

    /// PUT `bytes` to the signed `upload_url`, reporting progress as it goes.
    async fn upload(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Vec<u8>,
        progress: ProgressFn,
    ) -> Result<(), RemoteError>;

    async fn finalize(&self, file_id: &str) -> Result<FinalizeFileResponse, RemoteError>;

    async fn process(
        &self,
        request: &ProcessBulkUploadRequest,
    ) -> Result<ProcessBulkUploadResponse, RemoteError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStage {
    Columns,
    Intent,
    Upload,
    Finalize,
    Process,
}

impl UploadStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Columns => "reading columns",
            Self::Intent => "requesting upload",
            Self::Upload => "uploading",
            Self::Finalize => "finalizing",
            Self::Process => "processing",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("no column names found in the header row")]
    EmptyColumns,
    #[error("unsupported file type: {0} (expected .csv or .tsv)")]
    UnsupportedFormat(String),
    #[error("cannot read file: {0}")]
    Read(String),
    #[error("upload rejected: {0}")]
    IntentRejected(String),
    #[error("upload failed: {0}")]
    Transport(String),
    #[error("finalize failed: {0}")]
    FinalizeFailed(String),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
    #[error("cannot {attempted} while {current}")]
    InvalidTransition {
        attempted: &'static str,
        current: &'static str,
    },
}

/// Observable state of the upload flow.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum UploadState {
    #[default]
    Idle,
    ColumnsExtracted {
        columns: Vec<String>,
    },
    IntentCreated {
        file_id: String,
    },
    Uploading {
        percent: u8,
    },
    Finalized {
        file_id: String,
        object_key: String,
    },
    Processed {
        queued: bool,
    },
    Failed {
        stage: UploadStage,
        message: String,
    },
}

impl UploadState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ColumnsExtracted { .. } => "columns extracted",
            Self::IntentCreated { .. } => "intent created",
            Self::Uploading { .. } => "uploading",
            Self::Finalized { .. } => "finalized",
            Self::Processed { .. } => "processed",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed { .. } | Self::Failed { .. })
    }
}

/// Data produced by completed steps, dropped on reset.
#[derive(Debug, Default)]
struct Session {
    file: Option<UploadFile>,
    columns: Vec<String>,
    intent: Option<FileIntentResponse>,
    uploaded: bool,
    finalized: Option<FinalizeFileResponse>,
    processed: Option<ProcessBulkUploadResponse>,
}

pub struct UploadOrchestrator {
    backend: Arc<dyn FileBackend>,
    state: watch::Sender<UploadState>,
    session: Session,
}

impl UploadOrchestrator {
    pub fn new(backend: Arc<dyn FileBackend>) -> Self {
        let (state, _) = watch::channel(UploadState::Idle);
        Self {
            backend,
            state,
            session: Session::default(),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn columns(&self) -> &[String] {
        &self.session.columns
    }

    pub fn intent(&self) -> Option<&FileIntentResponse> {
        self.session.intent.as_ref()
    }

    pub fn finalized(&self) -> Option<&FinalizeFileResponse> {
        self.session.finalized.as_ref()
    }

    pub fn processed(&self) -> Option<&ProcessBulkUploadResponse> {
        self.session.processed.as_ref()
    }

    /// Back to `Idle`, dropping every derived value.
    pub fn reset(&mut self) {
        self.session = Session::default();
        self.set_state(UploadState::Idle);
    }

    /// Runs every step in order and stops at the first failure.
    pub async fn run(
        &mut self,
        file: UploadFile,
        purpose: BulkPurpose,
        confirm: bool,
    ) -> Result<ProcessBulkUploadResponse, UploadError> {
        self.extract_columns(file)?;
        self.create_intent(purpose).await?;
        self.upload().await?;
        self.finalize().await?;
        self.process(confirm).await
    }

    /// Step 1: header row to column names.
    pub fn extract_columns(&mut self, file: UploadFile) -> Result<&[String], UploadError> {
        self.expect_state("read columns", |state| matches!(state, UploadState::Idle))?;

        let columns = match file.columns() {
            Ok(columns) => columns,
            Err(err) => return Err(self.fail(UploadStage::Columns, err)),
        };
        tracing::info!(
            file = file.file_name(),
            columns = columns.len(),
            "extracted upload columns"
        );

        self.session.file = Some(file);
        self.session.columns = columns.clone();
        self.set_state(UploadState::ColumnsExtracted { columns });
        Ok(&self.session.columns)
    }

    /// Step 2: ask the backend for a signed upload URL.
    pub async fn create_intent(
        &mut self,
        purpose: BulkPurpose,
    ) -> Result<&FileIntentResponse, UploadError> {
        self.expect_state("request an upload", |state| {
            matches!(state, UploadState::ColumnsExtracted { .. })
        })?;
        let Some(file) = self.session.file.as_ref() else {
            return Err(self.invalid("request an upload"));
        };

        let request = FileIntentRequest {
            file_name: file.file_name().to_string(),
            content_type: file.format().content_type().to_string(),
            size: file.size(),
            checksum: file.checksum(),
            columns: self.session.columns.clone(),
            purpose,
        };

        let intent = match self.backend.create_intent(&request).await {
            Ok(intent) => intent,
            Err(err) => {
                let err = UploadError::IntentRejected(err.user_message());
                return Err(self.fail(UploadStage::Intent, err));
            }
        };
        tracing::info!(file_id = %intent.file_id, "upload intent created");

        self.set_state(UploadState::IntentCreated {
            file_id: intent.file_id.clone(),
        });
        Ok(self.session.intent.insert(intent))
    }

    /// Step 3: PUT the bytes to the signed URL.
    pub async fn upload(&mut self) -> Result<(), UploadError> {
        self.expect_state("upload", |state| {
            matches!(state, UploadState::IntentCreated { .. })
        })?;
        let (Some(file), Some(intent)) = (self.session.file.as_ref(), self.session.intent.as_ref())
        else {
            return Err(self.invalid("upload"));
        };

        let upload_url = intent.upload_url.clone();
        let content_type = file.format().content_type();
        let bytes = file.bytes().to_vec();

        self.set_state(UploadState::Uploading { percent: 0 });
        let state = self.state.clone();
        let progress: ProgressFn = Arc::new(move |sent, total| {
            let percent = percent_of(sent, total);
            state.send_if_modified(|current| match current {
                UploadState::Uploading { percent: previous } if *previous != percent => {
                    *previous = percent;
                    true
                }
                _ => false,
            });
        });

        if let Err(err) = self
            .backend
            .upload(&upload_url, content_type, bytes, progress)
            .await
        {
            let err = UploadError::Transport(err.user_message());
            return Err(self.fail(UploadStage::Upload, err));
        }

        self.session.uploaded = true;
        self.set_state(UploadState::Uploading { percent: 100 });
        Ok(())
    }

    /// Step 4a: mark the upload complete server-side.
    pub async fn finalize(&mut self) -> Result<&FinalizeFileResponse, UploadError> {
        let uploaded = self.session.uploaded;
        self.expect_state("finalize", |state| {
            uploaded && matches!(state, UploadState::Uploading { .. })
        })?;
        let Some(file_id) = self.session.intent.as_ref().map(|i| i.file_id.clone()) else {
            return Err(self.invalid("finalize"));
        };

        let finalized = match self.backend.finalize(&file_id).await {
            Ok(finalized) => finalized,
            Err(err) => {
                let err = UploadError::FinalizeFailed(err.user_message());
                return Err(self.fail(UploadStage::Finalize, err));
            }
        };
        tracing::info!(%file_id, object_key = %finalized.object_key, "upload finalized");

        self.set_state(UploadState::Finalized {
            file_id,
            object_key: finalized.object_key.clone(),
        });
        Ok(self.session.finalized.insert(finalized))
    }

    /// Step 4b: ask for bulk processing of the finalized file.
    ///
    /// `confirm = false` asks only for a preview.
    pub async fn process(
        &mut self,
        confirm: bool,
    ) -> Result<ProcessBulkUploadResponse, UploadError> {
        self.expect_state("process", |state| {
            matches!(state, UploadState::Finalized { .. })
        })?;
        let Some(file_id) = self.session.intent.as_ref().map(|i| i.file_id.clone()) else {
            return Err(self.invalid("process"));
        };

        let request = ProcessBulkUploadRequest { file_id, confirm };
        let processed = match self.backend.process(&request).await {
            Ok(processed) => processed,
            Err(err) => {
                // The finalized file stays on the server for manual reprocessing.
                tracing::warn!(file_id = %request.file_id, "bulk processing failed: {err}");
                let err = UploadError::ProcessingFailed(err.user_message());
                return Err(self.fail(UploadStage::Process, err));
            }
        };
        tracing::info!(
            file_id = %request.file_id,
            queued = processed.queued,
            "bulk processing requested"
        );

        self.set_state(UploadState::Processed {
            queued: processed.queued,
        });
        self.session.processed = Some(processed.clone());
        Ok(processed)
    }

    fn set_state(&self, state: UploadState) {
        self.state.send_replace(state);
    }

    fn fail(&self, stage: UploadStage, err: UploadError) -> UploadError {
        tracing::warn!(stage = stage.label(), "upload step failed: {err}");
        self.set_state(UploadState::Failed {
            stage,
            message: err.to_string(),
        });
        err
    }

    fn expect_state(
        &self,
        attempted: &'static str,
        allowed: impl FnOnce(&UploadState) -> bool,
    ) -> Result<(), UploadError> {
        let allowed = {
            let current = self.state.borrow();
            allowed(&*current)
        };
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(attempted))
        }
    }

    fn invalid(&self, attempted: &'static str) -> UploadError {
        UploadError::InvalidTransition {
            attempted,
            current: self.state.borrow().label(),
        }
    }
}

fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = sent.min(total).saturating_mul(100) / total;
    percent as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent_of(0, 0), 100);
        assert_eq!(percent_of(50, 200), 25);
        assert_eq!(percent_of(300, 200), 100);
    }
}
