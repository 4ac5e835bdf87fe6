//! Resolved request descriptions

use std::time::Duration;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::body::Body;
use crate::{Error, Result};

/// A fully resolved outbound HTTP request.
///
/// Produced by [`Requestable::as_url_request`](crate::Requestable::as_url_request)
/// and consumed by the operations. Holds plain data only; nothing touches the
/// network until an operation is resumed.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Optional body
    pub body: Option<Body>,
    /// Per-request timeout overriding the session timeout
    pub timeout: Option<Duration>,
}

impl UrlRequest {
    /// Create a request with no headers and no body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Parse `url` and create a request for it
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self::new(method, url))
    }

    /// Add a header, replacing any previous value with the same name
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())
            .map_err(|e| Error::Encoding(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| Error::Encoding(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the request body.
    ///
    /// The body's content type is applied unless a `Content-Type` header is
    /// already present.
    pub fn body(mut self, body: Body) -> Self {
        self.set_body(body);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn set_body(&mut self, body: Body) {
        if let Some(content_type) = body.content_type() {
            if !self.headers.contains_key(CONTENT_TYPE) {
                if let Ok(value) = HeaderValue::from_str(content_type) {
                    self.headers.insert(CONTENT_TYPE, value);
                }
            }
        }
        self.body = Some(body);
    }
}
