//! Operations that buffer the response body in memory

use std::sync::Arc;

use bytes::BytesMut;

use crate::backend::ReqwestBackend;
use crate::operation::{OperationState, Progress, Task};
use crate::request::UrlRequest;
use crate::response::Response;
use crate::session::Session;
use crate::validation::Validator;
use crate::Result;

/// A request whose response body is collected into memory
#[derive(Clone)]
pub struct DataOperation {
    task: Task<Response>,
    request: Arc<UrlRequest>,
    progress: Progress,
}

impl DataOperation {
    pub(crate) fn new(session: &Session, request: UrlRequest, validator: Option<Validator>) -> Self {
        let progress = Progress::default();
        let label = format!("{} {}", request.method, request.url);
        let job = fetch(
            session.backend().clone(),
            request.clone(),
            validator,
            progress.clone(),
        );

        Self {
            task: Task::new(label, Box::pin(job)),
            request: Arc::new(request),
            progress,
        }
    }

    /// The request this operation sends
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

    /// Receive `(bytes_received, total_if_known)` as the body arrives
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

impl std::fmt::Debug for DataOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataOperation")
            .field("request", &self.request)
            .field("state", &self.state())
            .finish()
    }
}

async fn fetch(
    backend: ReqwestBackend,
    request: UrlRequest,
    validator: Option<Validator>,
    progress: Progress,
) -> Result<Response> {
    let mut response = backend.execute(request.into()).await?;
    let meta = response.meta();

    if let Some(validator) = &validator {
        validator.validate(&meta)?;
    }

    let total = response.content_length;
    let mut body = BytesMut::new();
    while let Some(chunk) = response.body_receiver.recv().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        progress.report(body.len() as u64, total);
    }

    Ok(Response::new(meta, body.freeze()))
}
