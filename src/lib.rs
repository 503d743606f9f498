//! `wsgi-bridge` runs an unmodified WSGI-style synchronous application behind
//! an AWS API Gateway Lambda proxy integration.
//!
//! The gateway delivers each HTTP request as one structured event and expects
//! one buffered response back from the same invocation; applications written
//! against the two-phase calling convention (an environment mapping plus a
//! start-response callback, then a returned body chunk sequence) know nothing
//! about either. This crate translates between the two sides:
//!
//! - [`event`]: gateway proxy event + translation into a normalized request
//! - [`request`]: the normalized request value and its structural view
//! - [`environ`]: per-invocation environment synthesis
//! - [`response`]: start-response collection and outbound response shapes
//! - [`handler`]: the per-event invocation driver and setup surface
//! - [`error`]: pluggable error formatting
//!
//! ```
//! use wsgi_bridge::{body, wsgi_handler, ApiGatewayProxyEvent, AppBody, Environ, StartResponse};
//!
//! let handler = wsgi_handler(|_env: &mut Environ, sr: &mut StartResponse| -> anyhow::Result<AppBody> {
//!     sr.start(
//!         "200 OK",
//!         vec![("Content-Type".to_string(), "text/plain".to_string())],
//!         None,
//!     )?;
//!     Ok(body(["Hello ", "World"]))
//! })
//! .with_server("localhost", 80);
//!
//! let event: ApiGatewayProxyEvent =
//!     serde_json::from_str(r#"{"path": "/hello", "httpMethod": "GET"}"#)?;
//! let response = handler.handle_event(&event)?;
//! assert_eq!(response.status_code, "200");
//! assert_eq!(response.body, "Hello World");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod environ;
pub mod error;
pub mod event;
pub mod handler;
pub mod request;
pub mod response;

pub use environ::{Environ, ErrorLog, WSGI_VERSION};
pub use error::{basic_error_handler, ErrorHandler, TranslateError};
pub use event::ApiGatewayProxyEvent;
pub use handler::{body, wsgi_handler, AppBody, WsgiApplication, WsgiHandler};
pub use request::{TranslatedRequest, WsgiRequest};
pub use response::{BodyChunk, GatewayResponse, StartResponse, SERVER_IDENT};
