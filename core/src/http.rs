//! Request and response values for the build/send/parse pipeline.
//!
//! # Design
//! A call is built into an `HttpRequest`, sent by a `Transport`, and the
//! `HttpResponse` it returns is parsed. Both ends are plain data, so the
//! header, encoding and error-extraction rules are testable on their own.
//!
//! Parameters are form-encoded (`key=value` pairs, arrays as `key[]`, nested
//! objects as `key[sub]`, booleans as `1`/`0`) both in the query string and,
//! by default, in the body. `BodyFormat::Json` sends body parameters as a
//! JSON object instead.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::TransportError;

/// Request parameters, keyed by name. Keys are unique.
pub type Parameters = Map<String, Value>;

/// Header name/value pairs, in the order they are sent.
pub type HeaderSet = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where request parameters are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterEncoding {
    /// Appended to the URL as `key=value` pairs.
    QueryString,
    /// Sent in the request body, formatted per `BodyFormat`.
    Body,
}

/// How body-encoded parameters are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyFormat {
    /// `key=value` pairs, the same encoding as the query string.
    #[default]
    Form,
    /// A JSON object.
    Json,
}

impl std::str::FromStr for BodyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(BodyFormat::Form),
            "json" => Ok(BodyFormat::Json),
            other => Err(format!("expected `form` or `json`, got `{other}`")),
        }
    }
}

/// One call as described by the facade, before headers and encoding apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub parameters: Option<Parameters>,
    pub encoding: ParameterEncoding,
}

/// An HTTP request described as plain data, ready for a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderSet,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderSet,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a HeaderSet, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Convert any serializable payload into a parameter map.
///
/// Fails unless `value` serializes to a JSON object.
pub fn to_parameters<S: Serialize + ?Sized>(value: &S) -> Result<Parameters, TransportError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(TransportError::InvalidRequest(format!(
            "parameters must be a JSON object, got {other}"
        ))),
        Err(e) => Err(TransportError::InvalidRequest(e.to_string())),
    }
}

/// Append `parameters` to `url` as a query string.
///
/// Uses `&` when `url` already carries a query. An empty map leaves the URL
/// untouched.
pub fn append_query(url: &str, parameters: &Parameters) -> String {
    if parameters.is_empty() {
        return url.to_string();
    }
    let query = encode_form(parameters);
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Form-encode `parameters` with keys in sorted order.
pub fn encode_form(parameters: &Parameters) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in sorted(parameters) {
        push_pairs(&mut serializer, key, value);
    }
    serializer.finish()
}

fn sorted(map: &Parameters) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn push_pairs(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            let nested = format!("{key}[]");
            for item in items {
                push_pairs(serializer, &nested, item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in sorted(map) {
                push_pairs(serializer, &format!("{key}[{sub}]"), item);
            }
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Null => {
            serializer.append_pair(key, "");
        }
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "1" } else { "0" });
        }
        other => {
            serializer.append_pair(key, &other.to_string());
        }
    }
}
