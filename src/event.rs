//! API Gateway proxy (v1) events and their translation into a
//! [`TranslatedRequest`].
//!
//! The event is this crate's own serde model rather than a borrowed one so
//! that header and query maps keep their source iteration order, which the
//! translator's output depends on.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{error::TranslateError, request::TranslatedRequest};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One inbound event from the gateway (Lambda proxy integration, v1 shape).
pub struct ApiGatewayProxyEvent {
    #[serde(default)]
    pub resource: Option<String>,
    pub path: String,
    pub http_method: String,

    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    /// Multi-valued variant of `headers`; both maps may be present for the
    /// same request.
    pub multi_value_headers: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub query_string_parameters: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<IndexMap<String, Vec<String>>>,

    #[serde(default)]
    pub path_parameters: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub stage_variables: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub request_context: Option<serde_json::Value>,

    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiGatewayProxyEvent {
    /// Translate the event into the request shape the bridge invokes with.
    ///
    /// Pure: no side effects and no partial results. Single-valued header
    /// and query maps are consumed first, then the multi-valued maps (each
    /// value list comma-joined into one value); on a key collision the
    /// multi-valued entry wins. An invalid base64 body is the one way this
    /// fails, and it fails before anything else is observable.
    pub fn to_request(&self) -> Result<TranslatedRequest, TranslateError> {
        let mut headers = IndexMap::new();
        for (name, value) in &self.headers {
            headers.insert(cgi_header_key(name), value.clone());
        }
        for (name, values) in &self.multi_value_headers {
            headers.insert(cgi_header_key(name), values.join(","));
        }

        let mut pairs: Vec<String> = Vec::new();
        for (key, value) in self.query_string_parameters.iter().flatten() {
            pairs.push(format!("{key}={value}"));
        }
        for (key, values) in self.multi_value_query_string_parameters.iter().flatten() {
            pairs.push(format!("{key}={}", values.join(",")));
        }
        let query_string = if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("&"))
        };

        let body = match &self.body {
            Some(body) if self.is_base64_encoded => Bytes::from(STANDARD.decode(body)?),
            Some(body) => Bytes::from(body.clone()),
            None => Bytes::new(),
        };

        Ok(TranslatedRequest {
            path: self.path.clone(),
            method: self.http_method.clone(),
            headers,
            query_string,
            body,
        })
    }
}

/// `Header-Name` -> `HTTP_HEADER_NAME`.
fn cgi_header_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 5);
    key.push_str("HTTP_");
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            key.push(ch.to_ascii_uppercase());
        } else {
            key.push('_');
        }
    }
    key
}
