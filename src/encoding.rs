//! Parameter encodings applied while resolving a request

use std::borrow::Cow;

use http::Method;
use serde_json::Value;

use crate::body::Body;
use crate::request::UrlRequest;
use crate::Result;

/// Parameters attached to a request
pub type Parameters = serde_json::Map<String, Value>;

/// How [`Parameters`] are written into a [`UrlRequest`].
///
/// Nested arrays encode as `key[]=value`, nested objects as `key[sub]=value`,
/// booleans as `1`/`0` and `null` as an empty value. Keys are emitted in
/// sorted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterEncoding {
    /// Query string for `GET`, `HEAD` and `DELETE`, form body otherwise
    #[default]
    Url,
    /// Always the query string
    QueryString,
    /// Always a form-encoded body
    HttpBody,
    /// A JSON body
    Json,
}

impl ParameterEncoding {
    /// Write `parameters` into `request`
    pub fn encode(&self, request: &mut UrlRequest, parameters: &Parameters) -> Result<()> {
        match self {
            ParameterEncoding::Json => {
                request.set_body(Body::Json {
                    value: Value::Object(parameters.clone()),
                });
            }
            ParameterEncoding::Url if encodes_in_url(&request.method) => {
                append_query(request, parameters)
            }
            ParameterEncoding::QueryString => append_query(request, parameters),
            ParameterEncoding::Url | ParameterEncoding::HttpBody => {
                request.set_body(Body::Form {
                    fields: query_components(parameters)
                        .into_iter()
                        .map(|(k, v)| (Cow::Owned(k), Cow::Owned(v)))
                        .collect(),
                });
            }
        }
        Ok(())
    }
}

fn encodes_in_url(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

fn append_query(request: &mut UrlRequest, parameters: &Parameters) {
    if parameters.is_empty() {
        return;
    }
    let components = query_components(parameters);
    let mut pairs = request.url.query_pairs_mut();
    for (key, value) in &components {
        pairs.append_pair(key, value);
    }
}

/// Flatten parameters into `(key, value)` pairs
pub(crate) fn query_components(parameters: &Parameters) -> Vec<(String, String)> {
    let mut components = Vec::new();
    for (key, value) in sorted(parameters) {
        flatten(key, value, &mut components);
    }
    components
}

fn sorted(map: &Parameters) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn flatten(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested_key, nested) in sorted(map) {
                flatten(&format!("{}[{}]", key, nested_key), nested, out);
            }
        }
        Value::Array(items) => {
            let key = format!("{}[]", key);
            for item in items {
                flatten(&key, item, out);
            }
        }
        Value::Bool(flag) => out.push((key.to_string(), if *flag { "1" } else { "0" }.into())),
        Value::Null => out.push((key.to_string(), String::new())),
        Value::Number(number) => out.push((key.to_string(), number.to_string())),
        Value::String(text) => out.push((key.to_string(), text.clone())),
    }
}
