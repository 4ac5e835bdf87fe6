//! Operations that send a body and collect the response

use std::path::PathBuf;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::backend::ReqwestBackend;
use crate::backend::types::BackendRequest;
use crate::body::{Body, MultipartPart};
use crate::operation::{OperationState, Progress, Task};
use crate::request::UrlRequest;
use crate::response::Response;
use crate::session::Session;
use crate::validation::Validator;
use crate::Result;

/// What an upload sends
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    /// In-memory bytes
    Data(Bytes),
    /// Contents of a file, read when the operation starts
    File(PathBuf),
    /// A `multipart/form-data` body
    Multipart(Vec<MultipartPart>),
}

impl UploadSource {
    async fn into_body(self) -> Result<Body> {
        Ok(match self {
            UploadSource::Data(data) => Body::bytes(data, "application/octet-stream"),
            UploadSource::File(path) => {
                let data = tokio::fs::read(&path).await?;
                Body::bytes(data, "application/octet-stream")
            }
            UploadSource::Multipart(parts) => Body::multipart(parts),
        })
    }
}

impl From<Bytes> for UploadSource {
    fn from(data: Bytes) -> Self {
        UploadSource::Data(data)
    }
}

impl From<Vec<u8>> for UploadSource {
    fn from(data: Vec<u8>) -> Self {
        UploadSource::Data(Bytes::from(data))
    }
}

impl From<PathBuf> for UploadSource {
    fn from(path: PathBuf) -> Self {
        UploadSource::File(path)
    }
}

/// A request that uploads a body and buffers the response
#[derive(Clone)]
pub struct UploadOperation {
    task: Task<Response>,
    request: Arc<UrlRequest>,
    progress: Progress,
}

impl UploadOperation {
    pub(crate) fn new(
        session: &Session,
        request: UrlRequest,
        source: UploadSource,
        validator: Option<Validator>,
    ) -> Self {
        let progress = Progress::default();
        let label = format!("upload {} {}", request.method, request.url);
        let job = upload(
            session.backend().clone(),
            request.clone(),
            source,
            validator,
            progress.clone(),
        );

        Self {
            task: Task::new(label, Box::pin(job)),
            request: Arc::new(request),
            progress,
        }
    }

    /// The request this operation sends, without the upload body
    pub fn request(&self) -> &UrlRequest {
        &self.request
    }

    /// Current lifecycle state
    pub fn state(&self) -> OperationState {
        self.task.state()
    }

    /// Whether the operation has been resumed
    pub fn is_started(&self) -> bool {
        self.state() != OperationState::Idle
    }

    /// Start the operation. Must be called from within a tokio runtime.
    pub fn resume(&self) -> bool {
        self.task.resume()
    }

    /// Cancel the operation
    pub fn cancel(&self) -> bool {
        self.task.cancel()
    }

    /// Receive `(bytes_sent, total_if_known)` as the body is sent
    pub fn on_progress<F>(&self, callback: F) -> &Self
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        self.progress.set(Arc::new(callback));
        self
    }

    /// Wait for the response
    pub async fn response(&self) -> Result<Response> {
        self.task.wait().await
    }
}

impl std::fmt::Debug for UploadOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOperation")
            .field("request", &self.request)
            .field("state", &self.state())
            .finish()
    }
}

async fn upload(
    backend: ReqwestBackend,
    mut request: UrlRequest,
    source: UploadSource,
    validator: Option<Validator>,
    progress: Progress,
) -> Result<Response> {
    request.set_body(source.into_body().await?);

    let mut backend_request = BackendRequest::from(request);
    backend_request.progress_callback = Some(progress.forwarder());

    let mut response = backend.execute(backend_request).await?;
    let meta = response.meta();

    if let Some(validator) = &validator {
        validator.validate(&meta)?;
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.body_receiver.recv().await {
        body.extend_from_slice(&chunk?);
    }

    Ok(Response::new(meta, body.freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn data_source_is_octet_stream() {
        let body = UploadSource::from(b"abc".to_vec()).into_body().await.unwrap();
        assert_eq!(body.content_type(), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn file_source_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, b"payload").unwrap();

        let body = UploadSource::File(path).into_body().await.unwrap();
        assert_eq!(
            body,
            Body::bytes(Bytes::from_static(b"payload"), "application/octet-stream")
        );
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let result = UploadSource::File(PathBuf::from("/nonexistent/requestable/upload"))
            .into_body()
            .await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
