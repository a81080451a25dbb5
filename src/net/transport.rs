//! Transport interfaces.
//!
//! The facade never performs I/O itself. It talks to two collaborators:
//!
//! - an [`AcceleratedTransport`]: a pooled client that takes plain-string
//!   bodies and always follows redirects (up to its hop limit), and
//! - a [`FallbackTransport`]: a general-purpose fetch that encodes blob,
//!   url-encoded and multipart bodies and implements all three redirect
//!   modes.
//!
//! Both have reqwest-backed implementations: [`ReqwestTransport`] and
//! [`ReqwestFallback`].

mod fallback;
mod reqwest_client;

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use http::{HeaderMap, Method};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::net::modes::RedirectMode;
use crate::net::request::Body;
use crate::net::response::ResponseType;

pub use fallback::ReqwestFallback;
pub use reqwest_client::{ClientHandle, ReqwestTransport};

/// What went wrong inside a transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not connect (refused, DNS, TLS handshake).
    Connect,
    /// Redirect limit exceeded, or a redirect where none is allowed.
    Redirect,
    Timeout,
    /// The transport honored a cancellation signal.
    Aborted,
    /// Request could not be built (bad method, header, multipart part).
    Request,
    /// Reading or decoding the response body failed.
    Body,
    Other,
}

/// Error reported by a transport. The message is kept verbatim so callers
/// can still match on the underlying client's wording.
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    pub fn with_source(
        kind: TransportErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { kind, message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Minimal options for the accelerated transport. Only fields that were
/// actually supplied are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
    pub method: Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body: Option<String>,
}

impl TransportOptions {
    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.headers.is_none() && self.body.is_none()
    }
}

/// Everything the fallback transport needs for one request.
#[derive(Debug, Clone)]
pub struct FallbackRequest {
    pub redirect: RedirectMode,
    pub signal: Option<CancellationToken>,
    pub method: Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body: Body,
}

/// Raw response as produced by either transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Final URL after any redirects.
    pub url: Url,
    pub redirected: bool,
    pub response_type: ResponseType,
}

/// The fast path. One client handle is created per fetcher and reused for
/// every call, so connections are pooled.
pub trait AcceleratedTransport: Send + Sync + 'static {
    type Client: Send + Sync + 'static;

    fn create_client(&self) -> Result<Self::Client, TransportError>;

    /// Performs the request, following redirects. `options` is `None` when
    /// no method, headers or body were supplied.
    fn fetch_via_client(
        &self,
        client: &Self::Client,
        url: &str,
        options: Option<TransportOptions>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// The full-featured path, used for non-text bodies and non-follow redirects.
pub trait FallbackTransport: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &str,
        request: FallbackRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Redirect policy shared by both reqwest transports so that they agree on
/// loop detection.
pub(crate) fn follow_policy(max_redirects: usize) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error(TooManyRedirects { max: max_redirects })
        } else {
            attempt.follow()
        }
    })
}

#[derive(Debug)]
pub(crate) struct TooManyRedirects {
    max: usize,
}

impl fmt::Display for TooManyRedirects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "too many redirects (max {})", self.max)
    }
}

impl std::error::Error for TooManyRedirects {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_redirect() {
            TransportErrorKind::Redirect
        } else if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_builder() {
            TransportErrorKind::Request
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        let message = error_chain(&err);
        TransportError::with_source(kind, message, err)
    }
}

/// Joins an error and its sources: `"outer: inner: root"`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}

/// Canonical reason phrase for a status, `"Unknown"` for non-standard codes.
pub(crate) fn status_text(status: http::StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}
