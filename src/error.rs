//! Error formatting and the library's typed errors.

use chrono::Utc;
use indexmap::IndexMap;
use thiserror::Error;

use crate::response::{GatewayResponse, SERVER_IDENT};

/// Failure while translating a gateway event, before the invocation boundary
/// exists. These propagate to the caller instead of becoming error responses.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The payload was not a well-formed proxy event.
    #[error("malformed gateway event: {0}")]
    Event(#[from] serde_json::Error),
    /// The event flagged a base64 body that did not decode.
    #[error("invalid base64 request body: {0}")]
    Body(#[from] base64::DecodeError),
}

/// Converts a captured invocation error into the response handed to the
/// gateway. Installed per handler at setup time; the formatter owns the
/// entire response shape on the error path.
pub type ErrorHandler = Box<dyn Fn(&anyhow::Error) -> GatewayResponse + Send + Sync>;

/// Default error formatter: a fixed `500` with `Date` and `Server` headers
/// and a literal `"Server Error"` body. The underlying error is deliberately
/// never echoed to the caller.
pub fn basic_error_handler(_error: &anyhow::Error) -> GatewayResponse {
    GatewayResponse {
        status_code: "500".to_string(),
        headers: IndexMap::from([
            (
                "Date".to_string(),
                Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            ),
            ("Server".to_string(), SERVER_IDENT.to_string()),
        ]),
        body: "Server Error".to_string(),
    }
}
