//! Driving one application invocation per gateway event.

use indexmap::IndexMap;

use crate::{
    environ::Environ,
    error::{basic_error_handler, ErrorHandler, TranslateError},
    event::ApiGatewayProxyEvent,
    request::WsgiRequest,
    response::{BodyChunk, GatewayResponse, StartResponse},
};

/// Body sequence returned by an application. Any chunk may fail during
/// iteration, and such failures are caught by the invocation boundary.
pub type AppBody = Box<dyn Iterator<Item = anyhow::Result<BodyChunk>>>;

/// Box an in-memory chunk sequence into an [`AppBody`].
pub fn body<I, C>(chunks: I) -> AppBody
where
    I: IntoIterator<Item = C>,
    I::IntoIter: 'static,
    C: Into<BodyChunk> + 'static,
{
    Box::new(chunks.into_iter().map(|chunk| Ok(chunk.into())))
}

/// The synchronous calling convention this bridge drives.
///
/// Implementations must call [`StartResponse::start`] exactly once before
/// (or while) producing their body. Closures of the same shape implement
/// this trait directly.
pub trait WsgiApplication {
    fn call(
        &self,
        environ: &mut Environ,
        start_response: &mut StartResponse,
    ) -> anyhow::Result<AppBody>;
}

impl<F> WsgiApplication for F
where
    F: Fn(&mut Environ, &mut StartResponse) -> anyhow::Result<AppBody>,
{
    fn call(
        &self,
        environ: &mut Environ,
        start_response: &mut StartResponse,
    ) -> anyhow::Result<AppBody> {
        self(environ, start_response)
    }
}

/// Bridges gateway events to one application.
///
/// Holds everything an invocation needs (server identity, integrator
/// headers, error handler); each call constructs its own [`Environ`] and
/// [`StartResponse`], so nothing is shared across concurrent executions of
/// the surrounding host.
pub struct WsgiHandler<A> {
    application: A,
    additional_response_headers: IndexMap<String, String>,
    server_name: String,
    server_port: u16,
    error_handler: ErrorHandler,
}

/// Wrap an application for use behind the gateway.
pub fn wsgi_handler<A: WsgiApplication>(application: A) -> WsgiHandler<A> {
    WsgiHandler {
        application,
        additional_response_headers: IndexMap::new(),
        server_name: String::new(),
        server_port: 0,
        error_handler: Box::new(basic_error_handler),
    }
}

impl<A: WsgiApplication> WsgiHandler<A> {
    /// Server identity exposed as `SERVER_NAME`/`SERVER_PORT`. No socket is
    /// ever bound; this only matters when the application reads the values.
    pub fn with_server(mut self, name: impl Into<String>, port: u16) -> Self {
        self.server_name = name.into();
        self.server_port = port;
        self
    }

    /// Headers merged into every successful response after the
    /// application's own, winning on collision. The `Server` header still
    /// lands last.
    pub fn with_additional_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.additional_response_headers = headers;
        self
    }

    /// Replace the default error formatter. The formatter owns the full
    /// response shape on the error path; keep it trivially safe, because a
    /// formatter failure is fatal to the invocation.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&anyhow::Error) -> GatewayResponse + Send + Sync + 'static,
    {
        self.error_handler = Box::new(handler);
        self
    }

    /// Run one request through the application.
    ///
    /// The application is invoked exactly once; there are no retries. Any
    /// error it raises during the call, while its body is drained, or
    /// through callback misuse is captured and formatted by the installed
    /// error handler rather than propagated.
    pub fn handle_request<R>(&self, request: &R) -> GatewayResponse
    where
        R: WsgiRequest + ?Sized,
    {
        let mut environ = Environ::generate(request, &self.server_name, self.server_port);
        let mut start_response = StartResponse::new();

        match self.invoke(&mut environ, &mut start_response) {
            Ok(body) => start_response
                .finish(body, &self.additional_response_headers)
                .unwrap_or_else(|err| self.error_response(&err)),
            Err(err) => self.error_response(&err),
        }
    }

    /// Translate a gateway event and run it through the application.
    ///
    /// Translation happens before the invocation boundary, so a malformed
    /// event surfaces as `Err` here rather than as an error response.
    pub fn handle_event(
        &self,
        event: &ApiGatewayProxyEvent,
    ) -> Result<GatewayResponse, TranslateError> {
        let request = event.to_request()?;
        Ok(self.handle_request(&request))
    }

    /// Entry point for raw event payload bytes, as delivered to a Lambda
    /// function's `main`.
    pub fn handle_raw_event(&self, payload: &[u8]) -> Result<GatewayResponse, TranslateError> {
        let event: ApiGatewayProxyEvent = serde_json::from_slice(payload)?;
        self.handle_event(&event)
    }

    fn invoke(
        &self,
        environ: &mut Environ,
        start_response: &mut StartResponse,
    ) -> anyhow::Result<String> {
        let chunks = self.application.call(environ, start_response)?;
        let mut body = String::new();
        for chunk in chunks {
            body.push_str(&chunk?.into_string());
        }
        Ok(body)
    }

    fn error_response(&self, err: &anyhow::Error) -> GatewayResponse {
        tracing::warn!(error = %err, "application invocation failed");
        (self.error_handler)(err)
    }
}
