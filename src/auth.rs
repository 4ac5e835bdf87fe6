//! Credentials attached to requestables

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderValue;

use crate::{Error, Result};

/// Credentials a [`Requestable`](crate::Requestable) sends with every request.
///
/// Each variant renders to an `Authorization` header value when the request is
/// resolved by [`Requestable::as_url_request`](crate::Requestable::as_url_request).
///
/// # Examples
///
/// ```rust
/// use requestable::{Auth, Requestable, Session};
///
/// struct Profile {
///     session: Session,
/// }
///
/// impl Requestable for Profile {
///     fn session(&self) -> &Session {
///         &self.session
///     }
///
///     fn path(&self) -> Option<String> {
///         Some("basic-auth/user/pass".into())
///     }
///
///     fn credentials(&self) -> Option<Auth> {
///         Some(Auth::basic("user", "pass"))
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// HTTP Basic authentication with username and password.
    ///
    /// This creates an `Authorization: Basic <base64(username:password)>` header.
    Basic {
        /// Username for basic authentication
        username: String,
        /// Password for basic authentication
        password: String,
    },
    /// Bearer token authentication (OAuth, JWT, etc.).
    Bearer {
        /// Bearer token
        token: String,
    },
    /// Custom authorization header with a custom scheme.
    ///
    /// This creates an `Authorization: <scheme> <credentials>` header.
    Custom {
        /// Authentication scheme (e.g., "ApiKey", "Digest")
        scheme: String,
        /// Credentials for the scheme
        credentials: String,
    },
}

impl Auth {
    /// Create HTTP Basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create Bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Create custom authentication with a custom scheme.
    pub fn custom(scheme: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self::Custom {
            scheme: scheme.into(),
            credentials: credentials.into(),
        }
    }

    /// Render the `Authorization` header value.
    ///
    /// ```rust
    /// use requestable::Auth;
    ///
    /// assert_eq!(Auth::basic("user", "pass").to_header_value(), "Basic dXNlcjpwYXNz");
    /// assert_eq!(Auth::bearer("token123").to_header_value(), "Bearer token123");
    /// ```
    pub fn to_header_value(&self) -> String {
        match self {
            Auth::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
            Auth::Bearer { token } => format!("Bearer {}", token),
            Auth::Custom {
                scheme,
                credentials,
            } => format!("{} {}", scheme, credentials),
        }
    }

    /// Render the header value as a sensitive [`HeaderValue`]
    pub(crate) fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.to_header_value())
            .map_err(|e| Error::Encoding(format!("Invalid credentials: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Basic { username, .. } => {
                write!(f, "Basic authentication for user: {}", username)
            }
            Auth::Bearer { .. } => write!(f, "Bearer token authentication"),
            Auth::Custom { scheme, .. } => write!(f, "Custom {} authentication", scheme),
        }
    }
}
