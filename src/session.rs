//! Sessions: the transport plus the configuration requestables inherit

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::backend::{BackendConfig, ProxyConfig, ReqwestBackend};
use crate::validation::Validation;
use crate::{Error, Result};

/// A configured transport shared by requestables.
///
/// Cloning is cheap; clones share the connection pool and configuration.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use requestable::Session;
///
/// # fn main() -> requestable::Result<()> {
/// let session = Session::builder()
///     .base_url("https://httpbin.org")
///     .timeout(Duration::from_secs(30))
///     .start_requests_immediately(false)
///     .build()?;
/// assert_eq!(session.base_url(), Some("https://httpbin.org"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Session {
    backend: ReqwestBackend,
    config: Arc<SessionConfig>,
}

#[derive(Debug)]
struct SessionConfig {
    base_url: Option<String>,
    start_requests_immediately: bool,
    validation: Validation,
}

impl Session {
    /// Create a new session with default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Base URL requestables resolve their paths against
    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    /// Whether operations are resumed as soon as they are created
    pub fn starts_requests_immediately(&self) -> bool {
        self.config.start_requests_immediately
    }

    /// The shared default validation policy
    pub fn validation(&self) -> &Validation {
        &self.config.validation
    }

    pub(crate) fn backend(&self) -> &ReqwestBackend {
        &self.backend
    }
}

/// Builder for creating sessions
#[derive(Debug)]
pub struct SessionBuilder {
    backend_config: BackendConfig,
    base_url: Option<String>,
    start_requests_immediately: bool,
    validation: Validation,
    error: Option<Error>,
}

impl SessionBuilder {
    /// Create a new session builder
    pub fn new() -> Self {
        Self {
            backend_config: BackendConfig::default(),
            base_url: None,
            start_requests_immediately: true,
            validation: Validation::default(),
            error: None,
        }
    }

    /// Set the base URL for all requests
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.backend_config.timeout = Some(timeout);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.backend_config.user_agent = Some(user_agent.into());
        self
    }

    /// Add a default header.
    ///
    /// An invalid name or value is reported by [`build`](Self::build).
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let parsed = HeaderName::from_bytes(name.as_ref().as_bytes())
            .map_err(|e| Error::Encoding(format!("Invalid header name: {}", e)))
            .and_then(|name| {
                HeaderValue::from_str(value.as_ref())
                    .map(|value| (name, value))
                    .map_err(|e| Error::Encoding(format!("Invalid header value: {}", e)))
            });

        match parsed {
            Ok((name, value)) => {
                self.backend_config
                    .default_headers
                    .get_or_insert_with(HeaderMap::new)
                    .insert(name, value);
            }
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Enable or disable cookies
    pub fn use_cookies(mut self, use_cookies: bool) -> Self {
        self.backend_config.use_cookies = Some(use_cookies);
        self
    }

    /// Set HTTP proxy
    pub fn http_proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.backend_config.http_proxy = Some(proxy(host.into(), port));
        self
    }

    /// Set HTTPS proxy
    pub fn https_proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.backend_config.https_proxy = Some(proxy(host.into(), port));
        self
    }

    /// Set proxy authentication for the configured proxies
    pub fn proxy_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let password = password.into();
        for proxy in [
            &mut self.backend_config.http_proxy,
            &mut self.backend_config.https_proxy,
        ]
        .into_iter()
        .flatten()
        {
            proxy.username = Some(username.clone());
            proxy.password = Some(password.clone());
        }
        self
    }

    /// Set the default validation policy requestables inherit
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    /// Choose whether `as_request()` resumes operations before returning them.
    ///
    /// Defaults to `true`.
    pub fn start_requests_immediately(mut self, start: bool) -> Self {
        self.start_requests_immediately = start;
        self
    }

    /// Build the session
    pub fn build(self) -> Result<Session> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let backend = ReqwestBackend::with_config(self.backend_config)?;

        Ok(Session {
            backend,
            config: Arc::new(SessionConfig {
                base_url: self.base_url,
                start_requests_immediately: self.start_requests_immediately,
                validation: self.validation,
            }),
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn proxy(host: String, port: u16) -> ProxyConfig {
    ProxyConfig {
        host,
        port,
        username: None,
        password: None,
    }
}
