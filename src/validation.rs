//! Response validation policies

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::response::ResponseMeta;
use crate::{Error, Result};

/// Predicate deciding whether a response counts as a success
pub type ValidationFn = Arc<dyn Fn(&ResponseMeta) -> bool + Send + Sync + 'static>;

/// Declarative validation policy.
///
/// The session carries one as its shared default, and requestables may
/// override it through [`Requestable::validation`](crate::Requestable::validation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Accepted status codes, `None` accepts any status
    pub acceptable_status_codes: Option<Range<u16>>,
    /// Accepted MIME types, `None` accepts any content type.
    ///
    /// Entries may use `*/*` or `type/*` wildcards.
    pub acceptable_content_types: Option<Vec<String>>,
}

impl Default for Validation {
    /// Accept `2xx` responses of any content type
    fn default() -> Self {
        Self {
            acceptable_status_codes: Some(200..300),
            acceptable_content_types: None,
        }
    }
}

impl Validation {
    /// A policy that accepts every response
    pub fn none() -> Self {
        Self {
            acceptable_status_codes: None,
            acceptable_content_types: None,
        }
    }

    /// Replace the accepted status codes
    pub fn status_codes(mut self, codes: Range<u16>) -> Self {
        self.acceptable_status_codes = Some(codes);
        self
    }

    /// Replace the accepted content types
    pub fn content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acceptable_content_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// The validator used for buffered data and upload responses
    pub fn data_validation(&self) -> Validator {
        Validator::Policy(self.clone())
    }

    /// The validator used for download responses
    pub fn download_validation(&self) -> Validator {
        Validator::Policy(self.clone())
    }

    /// Check `meta` against this policy
    pub fn validate(&self, meta: &ResponseMeta) -> Result<()> {
        let status = meta.status();
        if let Some(codes) = &self.acceptable_status_codes {
            if !codes.contains(&status) {
                return Err(Error::Validation {
                    status,
                    reason: format!(
                        "status code {} outside {}..{}",
                        status, codes.start, codes.end
                    ),
                });
            }
        }

        if let Some(types) = &self.acceptable_content_types {
            // An empty body carries no content type worth checking.
            if meta.content_length() == Some(0) || status == 204 {
                return Ok(());
            }
            let Some(content_type) = meta.content_type() else {
                return Err(Error::Validation {
                    status,
                    reason: "missing content type".to_string(),
                });
            };
            if !types.iter().any(|accepted| mime_matches(accepted, content_type)) {
                return Err(Error::Validation {
                    status,
                    reason: format!("unacceptable content type {}", content_type),
                });
            }
        }

        Ok(())
    }
}

fn mime_matches(accepted: &str, actual: &str) -> bool {
    let accepted = accepted.split(';').next().unwrap_or(accepted).trim();
    let (Some((accepted_type, accepted_sub)), Some((actual_type, actual_sub))) =
        (accepted.split_once('/'), actual.split_once('/'))
    else {
        return false;
    };

    let type_matches = accepted_type == "*" || accepted_type.eq_ignore_ascii_case(actual_type);
    let sub_matches = accepted_sub == "*" || accepted_sub.eq_ignore_ascii_case(actual_sub);
    type_matches && sub_matches
}

/// A validation step run against a response before it is handed back.
#[derive(Clone)]
pub enum Validator {
    /// Validate with a declarative policy
    Policy(Validation),
    /// Validate with a custom predicate
    Custom(ValidationFn),
}

impl Validator {
    /// Build a validator from a predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&ResponseMeta) -> bool + Send + Sync + 'static,
    {
        Validator::Custom(Arc::new(predicate))
    }

    /// Run the validator
    pub fn validate(&self, meta: &ResponseMeta) -> Result<()> {
        match self {
            Validator::Policy(validation) => validation.validate(meta),
            Validator::Custom(predicate) => {
                if predicate(meta) {
                    Ok(())
                } else {
                    Err(Error::Validation {
                        status: meta.status(),
                        reason: "rejected by custom validator".to_string(),
                    })
                }
            }
        }
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Validator::Policy(a), Validator::Policy(b)) => a == b,
            (Validator::Custom(a), Validator::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Policy(validation) => f.debug_tuple("Policy").field(validation).finish(),
            Validator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Validation> for Validator {
    fn from(validation: Validation) -> Self {
        Validator::Policy(validation)
    }
}
