use api_types::file::{
    FileIntentRequest, FileIntentResponse, FinalizeFileRequest, FinalizeFileResponse,
    ProcessBulkUploadRequest, ProcessBulkUploadResponse,
};
use async_trait::async_trait;
use engine::{FileBackend, RemoteError, upload::ProgressFn};
use futures::stream::{self, StreamExt};
use reqwest::{
    Body, Method, Url,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};

use crate::{
    api::{ApiClient, check},
    error::{ClientError, Result},
};

/// Size of the pieces the upload body is streamed in.
const UPLOAD_CHUNK: usize = 64 * 1024;

impl ApiClient {
    pub async fn create_file_intent(
        &self,
        request: &FileIntentRequest,
    ) -> Result<FileIntentResponse> {
        self.send_json(Method::POST, "files/intent", request).await
    }

    pub async fn finalize_file(&self, file_id: &str) -> Result<FinalizeFileResponse> {
        let request = FinalizeFileRequest {
            file_id: file_id.to_string(),
        };
        self.send_json(Method::POST, "files/finalize", &request)
            .await
    }

    pub async fn process_bulk_upload(
        &self,
        request: &ProcessBulkUploadRequest,
    ) -> Result<ProcessBulkUploadResponse> {
        self.send_json(Method::POST, "files/process", request).await
    }

    /// PUTs `bytes` to a pre-signed storage URL.
    ///
    /// The signed URL carries its own credentials, so no bearer token is sent.
    /// `progress` is called with `(sent, total)` as each chunk is handed to the
    /// connection.
    pub async fn put_signed(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Vec<u8>,
        progress: ProgressFn,
    ) -> Result<()> {
        let url = Url::parse(upload_url)
            .map_err(|err| ClientError::InvalidUrl(format!("{upload_url}: {err}")))?;
        let total = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();

        let mut sent = 0u64;
        let body = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<_, std::io::Error>(chunk)
        });

        tracing::debug!(host = url.host_str(), total, "uploading file to signed url");
        let res = self
            .http()
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(body))
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }
}

#[async_trait]
impl FileBackend for ApiClient {
    async fn create_intent(
        &self,
        request: &FileIntentRequest,
    ) -> std::result::Result<FileIntentResponse, RemoteError> {
        Ok(self.create_file_intent(request).await?)
    }

    async fn upload(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Vec<u8>,
        progress: ProgressFn,
    ) -> std::result::Result<(), RemoteError> {
        Ok(self
            .put_signed(upload_url, content_type, bytes, progress)
            .await?)
    }

    async fn finalize(
        &self,
        file_id: &str,
    ) -> std::result::Result<FinalizeFileResponse, RemoteError> {
        Ok(self.finalize_file(file_id).await?)
    }

    async fn process(
        &self,
        request: &ProcessBulkUploadRequest,
    ) -> std::result::Result<ProcessBulkUploadResponse, RemoteError> {
        Ok(self.process_bulk_upload(request).await?)
    }
}
