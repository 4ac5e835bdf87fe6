//! Response handling

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{Args, Error, Result};

/// Status line and headers of a response, available before the body is read.
///
/// Validators and download destinations receive this value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Final URL after redirects
    pub url: Url,
}

impl ResponseMeta {
    /// Get the response status code
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the MIME type without parameters
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|value| value.split(';').next().unwrap_or(value).trim())
    }

    /// Get the content length from headers
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// Get the suggested file name from `Content-Disposition`, falling back to
    /// the last path segment of the URL
    pub fn suggested_filename(&self) -> Option<String> {
        if let Some(disposition) = self.header("content-disposition") {
            let filename = disposition
                .split(';')
                .map(str::trim)
                .find_map(|part| part.strip_prefix("filename="))
                .map(|name| name.trim_matches('"'))
                .filter(|name| !name.is_empty());
            if let Some(filename) = filename {
                return Some(filename.to_string());
            }
        }

        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            })
    }
}

/// A buffered HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    meta: ResponseMeta,
    body: Bytes,
}

impl Response {
    pub(crate) fn new(meta: ResponseMeta, body: Bytes) -> Self {
        Self { meta, body }
    }

    /// Get the status line and headers
    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    /// Get the response status code
    pub fn status(&self) -> u16 {
        self.meta.status()
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        self.meta.is_success()
    }

    /// Get all headers
    pub fn headers(&self) -> &HeaderMap {
        &self.meta.headers
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.meta.header(name)
    }

    /// Get the response URL
    pub fn url(&self) -> &Url {
        &self.meta.url
    }

    /// Borrow the body
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return the body
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Return the body as text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(Error::from)
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    /// Decode the body as an [`Args`] envelope, `None` if it does not match
    pub fn args<T: DeserializeOwned>(&self) -> Option<Args<T>> {
        Args::from_slice(&self.body)
    }
}
