//! Gateway-agnostic request values.

use bytes::Bytes;
use indexmap::IndexMap;

/// The bridge's internal representation of one inbound request, produced by
/// translating a gateway event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedRequest {
    pub path: String,
    /// Upper-case HTTP verb as delivered by the gateway.
    pub method: String,
    /// Headers keyed by their CGI form (`HTTP_*`), unique after normalization.
    pub headers: IndexMap<String, String>,
    /// Joined `key=value` pairs, `None` when the event carried no parameters
    /// (never `Some("")`).
    pub query_string: Option<String>,
    /// Raw body bytes, base64-decoded when the event flagged binary encoding.
    pub body: Bytes,
}

/// Structural view of a request, as consumed by [`Environ::generate`].
///
/// Environment synthesis only needs attribute access, so any request-shaped
/// type can drive an invocation without converting into a concrete
/// [`TranslatedRequest`].
///
/// [`Environ::generate`]: crate::environ::Environ::generate
pub trait WsgiRequest {
    fn path(&self) -> &str;
    fn method(&self) -> &str;
    fn headers(&self) -> &IndexMap<String, String>;
    fn query_string(&self) -> Option<&str>;
    fn body(&self) -> &[u8];
}

impl WsgiRequest for TranslatedRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}
