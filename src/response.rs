//! Response collection: the start-response callback and outbound shapes.

use anyhow::bail;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;

/// Fixed identifying `Server` header value stamped on every response.
pub const SERVER_IDENT: &str = "WsgiBridge";

/// One chunk of an application body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyChunk {
    Text(String),
    Binary(Vec<u8>),
}

impl BodyChunk {
    /// Fold the chunk into the buffered response body. Binary chunks go
    /// through lossy UTF-8: the gateway response body is a string.
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl From<&str> for BodyChunk {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BodyChunk {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for BodyChunk {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<&[u8]> for BodyChunk {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl From<Bytes> for BodyChunk {
    fn from(value: Bytes) -> Self {
        Self::Binary(value.to_vec())
    }
}

/// Response returned to the gateway.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: String,
    pub headers: IndexMap<String, String>,
    pub body: String,
}

/// Records the status line and header list the application declares via the
/// start-response callback. One per invocation.
#[derive(Debug, Default)]
pub struct StartResponse {
    status: Option<String>,
    headers: IndexMap<String, String>,
}

impl StartResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// The start-response callback of the bridged calling convention.
    ///
    /// Must be called exactly once per invocation; a second call without
    /// `exc_info` is rejected. Passing `exc_info` supersedes the previously
    /// declared response: recorded headers are discarded before the new
    /// pairs are applied, never partially merged. Duplicate header names in
    /// `header_pairs` resolve last-wins, and the `Server` header is
    /// re-inserted last on every call so applications can never shadow it.
    ///
    /// The convention's returned write callable goes unused in a buffered
    /// bridge, so success is just `Ok(())`.
    pub fn start(
        &mut self,
        status: impl Into<String>,
        header_pairs: Vec<(String, String)>,
        exc_info: Option<anyhow::Error>,
    ) -> anyhow::Result<()> {
        match exc_info {
            Some(err) => {
                tracing::debug!(error = %err, "start_response re-entered with exc_info");
                self.headers.clear();
            }
            None if self.status.is_some() => {
                bail!("start_response called twice without exc_info");
            }
            None => {}
        }

        self.status = Some(status.into());
        for (name, value) in header_pairs {
            self.headers.insert(name, value);
        }
        self.pin_server_header();
        Ok(())
    }

    /// Status line recorded so far, e.g. `"200 OK"`.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Shape the final gateway response once the body has been drained.
    ///
    /// Fails when the application never invoked the callback. Integrator
    /// `additional_headers` are applied after the application's own, winning
    /// on collision; the `Server` header always lands last.
    pub fn finish(
        mut self,
        body: String,
        additional_headers: &IndexMap<String, String>,
    ) -> anyhow::Result<GatewayResponse> {
        let Some(status) = self.status.take() else {
            bail!("application never called start_response");
        };

        for (name, value) in additional_headers {
            self.headers.shift_remove(name);
            self.headers.insert(name.clone(), value.clone());
        }
        self.pin_server_header();

        let status_code = status.split(' ').next().unwrap_or_default().to_string();
        Ok(GatewayResponse {
            status_code,
            headers: self.headers,
            body,
        })
    }

    fn pin_server_header(&mut self) {
        self.headers.shift_remove("Server");
        self.headers
            .insert("Server".to_string(), SERVER_IDENT.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn records_status_and_headers_and_pins_server() {
        let mut sr = StartResponse::new();
        sr.start("200 OK", pairs(&[("H1", "Header1"), ("H2", "Header2")]), None)
            .unwrap();

        assert_eq!(sr.status(), Some("200 OK"));
        assert_eq!(sr.headers()["H1"], "Header1");
        assert_eq!(sr.headers()["H2"], "Header2");
        assert_eq!(sr.headers()["Server"], SERVER_IDENT);
    }

    #[test]
    fn rejects_a_second_call_without_exc_info() {
        let mut sr = StartResponse::new();
        sr.start("200 OK", Vec::new(), None).unwrap();
        assert!(sr.start("500 Oops", Vec::new(), None).is_err());
    }

    #[test]
    fn exc_info_reentry_resets_headers() {
        let mut sr = StartResponse::new();
        sr.start("200 OK", pairs(&[("H1", "Header1")]), None).unwrap();
        sr.start(
            "500 Internal Server Error",
            pairs(&[("H2", "Header2")]),
            Some(anyhow::anyhow!("headers already recorded")),
        )
        .unwrap();

        assert_eq!(sr.status(), Some("500 Internal Server Error"));
        assert!(sr.headers().get("H1").is_none());
        assert_eq!(sr.headers()["H2"], "Header2");
        assert_eq!(sr.headers()["Server"], SERVER_IDENT);
    }

    #[test]
    fn application_cannot_shadow_the_server_header() {
        let mut sr = StartResponse::new();
        sr.start("200 OK", pairs(&[("Server", "Impostor")]), None)
            .unwrap();
        assert_eq!(sr.headers()["Server"], SERVER_IDENT);
    }

    #[test]
    fn duplicate_header_names_resolve_last_wins() {
        let mut sr = StartResponse::new();
        sr.start("200 OK", pairs(&[("H1", "first"), ("H1", "second")]), None)
            .unwrap();
        assert_eq!(sr.headers()["H1"], "second");
    }

    #[test]
    fn finish_extracts_the_numeric_status_prefix() {
        let mut sr = StartResponse::new();
        sr.start("404 Not Found", Vec::new(), None).unwrap();

        let response = sr.finish("missing".to_string(), &IndexMap::new()).unwrap();
        assert_eq!(response.status_code, "404");
        assert_eq!(response.body, "missing");
    }

    #[test]
    fn finish_without_start_is_an_error() {
        let sr = StartResponse::new();
        assert!(sr.finish(String::new(), &IndexMap::new()).is_err());
    }

    #[test]
    fn additional_headers_override_and_server_lands_last() {
        let mut sr = StartResponse::new();
        sr.start("200 OK", pairs(&[("X-App", "app"), ("X-Shared", "app")]), None)
            .unwrap();

        let additional = IndexMap::from([
            ("X-Shared".to_string(), "integrator".to_string()),
            ("X-Extra".to_string(), "extra".to_string()),
        ]);
        let response = sr.finish(String::new(), &additional).unwrap();

        assert_eq!(response.headers["X-App"], "app");
        assert_eq!(response.headers["X-Shared"], "integrator");
        assert_eq!(response.headers["X-Extra"], "extra");
        let (last, _) = response.headers.last().unwrap();
        assert_eq!(last, "Server");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let response = GatewayResponse {
            status_code: "200".to_string(),
            headers: IndexMap::from([("H1".to_string(), "Header1".to_string())]),
            body: "ok".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], "200");
        assert_eq!(value["headers"]["H1"], "Header1");
        assert_eq!(value["body"], "ok");
    }

    #[test]
    fn binary_chunks_fold_via_lossy_utf8() {
        assert_eq!(BodyChunk::from("text").into_string(), "text");
        assert_eq!(BodyChunk::from(b"bytes".to_vec()).into_string(), "bytes");
    }
}
