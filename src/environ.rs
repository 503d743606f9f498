//! Per-invocation environment synthesis for the bridged calling convention.

use std::io::{self, Cursor, Write};

use bytes::Bytes;
use indexmap::IndexMap;
use memchr::memchr;

use crate::request::WsgiRequest;

/// Protocol version marker placed in every environment.
pub const WSGI_VERSION: (u8, u8) = (1, 0);

/// Write-only error stream handed to the application.
///
/// Complete lines are forwarded to `tracing::error!` under the
/// `wsgi::errors` target; a trailing partial line is emitted on `flush`.
#[derive(Debug, Default)]
pub struct ErrorLog {
    buf: Vec<u8>,
}

impl Write for ErrorLog {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        while let Some(pos) = memchr(b'\n', &self.buf) {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                tracing::error!(target: "wsgi::errors", "{line}");
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let line = String::from_utf8_lossy(&self.buf).into_owned();
            self.buf.clear();
            tracing::error!(target: "wsgi::errors", "{line}");
        }
        Ok(())
    }
}

/// The environment handed to the application: created fresh per invocation
/// and treated as read-only afterwards, except for [`input`](Self::input)
/// being drained once.
#[derive(Debug)]
pub struct Environ {
    /// Always [`WSGI_VERSION`].
    pub version: (u8, u8),
    /// Always `"http"`: the gateway terminates TLS before the event exists.
    pub url_scheme: &'static str,
    pub multithread: bool,
    pub multiprocess: bool,
    pub run_once: bool,
    /// CGI-style string variables: `REQUEST_METHOD`, `PATH_INFO`,
    /// `SERVER_NAME`, `SERVER_PORT`, `QUERY_STRING` (when present) and every
    /// `HTTP_*` header, in that insertion order.
    pub vars: IndexMap<String, String>,
    /// Readable request body, positioned at the start.
    pub input: Cursor<Bytes>,
    /// Write-only error/log stream.
    pub errors: ErrorLog,
}

impl Environ {
    /// Build the environment for one invocation.
    ///
    /// `QUERY_STRING` is omitted entirely when the request carries no query
    /// string; it is never present with an empty value. An empty header map
    /// still produces every mandatory key.
    pub fn generate<R>(request: &R, server_name: &str, server_port: u16) -> Self
    where
        R: WsgiRequest + ?Sized,
    {
        let mut vars = IndexMap::new();
        vars.insert("REQUEST_METHOD".to_string(), request.method().to_string());
        vars.insert("PATH_INFO".to_string(), request.path().to_string());
        vars.insert("SERVER_NAME".to_string(), server_name.to_string());
        vars.insert("SERVER_PORT".to_string(), server_port.to_string());
        if let Some(query) = request.query_string() {
            vars.insert("QUERY_STRING".to_string(), query.to_string());
        }
        for (key, value) in request.headers() {
            vars.insert(key.clone(), value.clone());
        }

        Self {
            version: WSGI_VERSION,
            url_scheme: "http",
            multithread: false,
            multiprocess: false,
            run_once: false,
            vars,
            input: Cursor::new(Bytes::copy_from_slice(request.body())),
            errors: ErrorLog::default(),
        }
    }

    /// Look up one string variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}
