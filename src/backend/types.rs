//! Types exchanged with the transport

use crate::body::Body;
use crate::request::UrlRequest;
use crate::response::ResponseMeta;
use http::{HeaderMap, Method, StatusCode};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use url::Url;

/// Transport-level HTTP request
pub struct BackendRequest {
    /// HTTP method for the request
    pub method: Method,
    /// URL for the request
    pub url: Url,
    /// Headers for the request
    pub headers: HeaderMap,
    /// Optional body content
    pub body: Option<Body>,
    /// Per-request timeout
    pub timeout: Option<Duration>,
    /// Optional progress callback for uploads
    pub progress_callback: Option<ProgressCallback>,
}

impl From<UrlRequest> for BackendRequest {
    fn from(request: UrlRequest) -> Self {
        Self {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
            timeout: request.timeout,
            progress_callback: None,
        }
    }
}

/// Transport-level HTTP response
pub struct BackendResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Final URL after redirects
    pub url: Url,
    /// Body length announced by the server
    pub content_length: Option<u64>,
    /// Stream of response body bytes
    pub body_receiver: mpsc::Receiver<Result<bytes::Bytes, crate::Error>>,
}

impl BackendResponse {
    /// Status line and headers without the body
    pub fn meta(&self) -> ResponseMeta {
        ResponseMeta {
            status: self.status,
            headers: self.headers.clone(),
            url: self.url.clone(),
        }
    }
}

/// Callback type for progress reporting: `(bytes_so_far, total_if_known)`
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync + 'static>;
