//! Describing an endpoint once and turning it into requests

use std::time::Duration;

use http::header::AUTHORIZATION;
use http::{HeaderMap, Method};
use url::Url;

use crate::auth::Auth;
use crate::encoding::{ParameterEncoding, Parameters};
use crate::operation::data::DataOperation;
use crate::request::UrlRequest;
use crate::session::Session;
use crate::validation::{Validation, Validator};
use crate::{Error, Result};

/// Something that knows how to build an HTTP request for itself.
///
/// Only [`session`](Self::session) is required; every other piece of the
/// request has a default that implementors override as needed.
///
/// # Examples
///
/// ```rust
/// use http::Method;
/// use requestable::{Parameters, Requestable, Session};
/// use serde_json::json;
///
/// struct Search {
///     session: Session,
///     query: String,
/// }
///
/// impl Requestable for Search {
///     fn session(&self) -> &Session {
///         &self.session
///     }
///
///     fn version(&self) -> Option<String> {
///         Some("v2".into())
///     }
///
///     fn path(&self) -> Option<String> {
///         Some("search".into())
///     }
///
///     fn parameters(&self) -> Option<Parameters> {
///         json!({ "q": self.query }).as_object().cloned()
///     }
/// }
///
/// # fn main() -> requestable::Result<()> {
/// let search = Search {
///     session: Session::builder().base_url("https://api.example.com").build()?,
///     query: "rust".into(),
/// };
/// let request = search.as_url_request()?;
/// assert_eq!(request.method, Method::GET);
/// assert_eq!(request.url.as_str(), "https://api.example.com/v2/search?q=rust");
/// # Ok(())
/// # }
/// ```
pub trait Requestable {
    /// Session the request is sent through
    fn session(&self) -> &Session;

    /// Base URL; defaults to the session's
    fn base_url(&self) -> Option<String> {
        self.session().base_url().map(str::to_string)
    }

    /// Version segment inserted between the base URL and the path
    fn version(&self) -> Option<String> {
        None
    }

    /// Path relative to the base URL, or an absolute `http(s)://` URL
    fn path(&self) -> Option<String> {
        None
    }

    /// HTTP method
    fn method(&self) -> Method {
        Method::GET
    }

    /// Parameters encoded into the request by [`encoding`](Self::encoding)
    fn parameters(&self) -> Option<Parameters> {
        None
    }

    /// How [`parameters`](Self::parameters) are encoded
    fn encoding(&self) -> ParameterEncoding {
        ParameterEncoding::default()
    }

    /// Extra request headers
    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Credentials sent as the `Authorization` header
    fn credentials(&self) -> Option<Auth> {
        None
    }

    /// Per-request timeout
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Validation policy; defaults to the session's
    fn validation(&self) -> Validation {
        self.session().validation().clone()
    }

    /// Whether `as_request()` resumes the operation before returning it
    fn starts_immediately(&self) -> bool {
        self.session().starts_requests_immediately()
    }

    /// Build the request
    fn as_url_request(&self) -> Result<UrlRequest> {
        let url = resolve_url(
            self.base_url().as_deref(),
            self.version().as_deref(),
            self.path().as_deref(),
        )?;

        let mut request = UrlRequest::new(self.method(), url);
        request.headers = self.headers();
        if let Some(credentials) = self.credentials() {
            request
                .headers
                .insert(AUTHORIZATION, credentials.header_value()?);
        }
        request.timeout = self.timeout();

        if let Some(parameters) = self.parameters() {
            self.encoding().encode(&mut request, &parameters)?;
        }

        Ok(request)
    }
}

/// A requestable whose response body is buffered in memory
pub trait DataRequestable: Requestable {
    /// Validator applied to the response; `None` accepts any response
    fn validation_block(&self) -> Option<Validator> {
        Some(self.validation().data_validation())
    }

    /// Build a data operation, resumed if [`starts_immediately`](Requestable::starts_immediately)
    fn as_request(&self) -> Result<DataOperation> {
        let request = self.as_url_request()?;
        let operation = DataOperation::new(self.session(), request, self.validation_block());
        if self.starts_immediately() {
            operation.resume();
        }
        Ok(operation)
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

pub(crate) fn resolve_url(
    base_url: Option<&str>,
    version: Option<&str>,
    path: Option<&str>,
) -> Result<Url> {
    if let Some(path) = path.filter(|path| is_absolute(path)) {
        return Url::parse(path).map_err(|e| Error::InvalidUrl(format!("{}: {}", path, e)));
    }

    let base = base_url.ok_or_else(|| Error::InvalidUrl("No base URL configured".to_string()))?;
    let mut url = base.trim_end_matches('/').to_string();

    if let Some(version) = version.map(|v| v.trim_matches('/')).filter(|v| !v.is_empty()) {
        url.push('/');
        url.push_str(version);
    }
    if let Some(path) = path.map(|p| p.trim_start_matches('/')).filter(|p| !p.is_empty()) {
        url.push('/');
        url.push_str(path);
    }

    Url::parse(&url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
}
