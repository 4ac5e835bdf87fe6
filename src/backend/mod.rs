//! Transport used by sessions to execute requests

pub mod reqwest;
pub mod types;

pub use self::reqwest::ReqwestBackend;

use std::time::Duration;

/// Proxy endpoint and optional credentials
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy host
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Username for proxy authentication
    pub username: Option<String>,
    /// Password for proxy authentication
    pub password: Option<String>,
}

/// Configuration for backend creation
#[derive(Clone, Debug, Default)]
pub struct BackendConfig {
    /// Request timeout
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Default headers to add to all requests
    pub default_headers: Option<http::HeaderMap>,
    /// Enable or disable cookies
    pub use_cookies: Option<bool>,
    /// HTTP proxy configuration
    pub http_proxy: Option<ProxyConfig>,
    /// HTTPS proxy configuration
    pub https_proxy: Option<ProxyConfig>,
}
