//! Transport dispatcher.
//!
//! Picks one of the two transports for a request, invokes it and maps its
//! failures into [`FetchError`]s.
//!
//! The **fallback** transport runs whenever the body is a blob, url-encoded
//! or multipart body, or the redirect mode is not `follow`. Everything else
//! goes through the **accelerated** transport with a minimal option set and
//! redirects always followed.

use http::{HeaderMap, Method};
use url::Url;

use crate::errors::FetchError;
use crate::net::modes::RedirectMode;
use crate::net::options::ResolvedOptions;
use crate::net::request::{Body, RequestId};
use crate::net::response::Response;
use crate::net::transport::{
    AcceleratedTransport, FallbackRequest, FallbackTransport, TransportError, TransportErrorKind,
    TransportOptions,
};

/// Canonical description of one fetch call, after normalization and option
/// resolution.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub id: RequestId,
    pub url: Url,
    /// The URL as the caller spelled it. Dispatch target and cache key.
    pub url_string: String,
    pub method: Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body: Body,
    pub options: ResolvedOptions,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DispatchPath {
    Accelerated,
    Fallback,
}

/// Decides which transport handles a request.
pub fn select_path(body: &Body, redirect: RedirectMode) -> DispatchPath {
    match body {
        Body::Blob(_) | Body::UrlEncoded(_) | Body::Multipart(_) => DispatchPath::Fallback,
        Body::Empty | Body::Text(_) if redirect != RedirectMode::Follow => DispatchPath::Fallback,
        Body::Empty | Body::Text(_) => DispatchPath::Accelerated,
    }
}

/// Builds the accelerated transport options. Fields that were not supplied
/// are left out, and `None` is returned when nothing was supplied at all.
pub fn accelerated_options(
    method: Option<&Method>,
    headers: Option<&HeaderMap>,
    body: &Body,
) -> Option<TransportOptions> {
    let options = TransportOptions {
        method: method.cloned(),
        headers: headers.cloned(),
        body: match body {
            Body::Text(text) => Some(text.clone()),
            _ => None,
        },
    };
    (!options.is_empty()).then_some(options)
}

const CONNECTION_REFUSED_PATTERN: &str = "error sending request";

/// Whether a transport error means the peer could not be reached.
pub fn is_connection_refused(err: &TransportError) -> bool {
    err.kind() == TransportErrorKind::Connect
        || err.message().to_ascii_lowercase().contains(CONNECTION_REFUSED_PATTERN)
}

/// Maps a transport failure. Connection refusals get the stable
/// `ECONNREFUSED` label, everything else passes through untouched.
pub fn map_transport_error(err: TransportError) -> FetchError {
    if err.kind() == TransportErrorKind::Aborted {
        return FetchError::Aborted;
    }
    if is_connection_refused(&err) {
        return FetchError::ConnectionRefused(err);
    }
    FetchError::Transport(err)
}

/// Maps a fallback failure. Under `redirect: error` any failure becomes a
/// [`FetchError::Redirect`].
pub fn map_fallback_error(err: TransportError, redirect: RedirectMode) -> FetchError {
    if redirect == RedirectMode::Error && err.kind() != TransportErrorKind::Aborted {
        return FetchError::Redirect { source: err };
    }
    map_transport_error(err)
}

/// Owns both transports and the long-lived accelerated client handle.
pub struct Dispatcher<A: AcceleratedTransport, F> {
    accelerated: A,
    client: A::Client,
    fallback: F,
}

impl<A: AcceleratedTransport, F: FallbackTransport> Dispatcher<A, F> {
    /// Creates the dispatcher. The accelerated client is created once here
    /// and reused for every request.
    pub fn new(accelerated: A, fallback: F) -> Result<Self, TransportError> {
        let client = accelerated.create_client()?;
        Ok(Self { accelerated, client, fallback })
    }

    pub async fn send(&self, req: &RequestDescriptor) -> Result<Response, FetchError> {
        let path = select_path(&req.body, req.options.redirect);
        log::debug!(
            "[{}] {} {} via {:?} (body: {}, redirect: {})",
            req.id,
            req.method.as_ref().unwrap_or(&Method::GET),
            req.url_string,
            path,
            req.body.kind(),
            req.options.redirect,
        );

        match path {
            DispatchPath::Accelerated => self.send_accelerated(req).await,
            DispatchPath::Fallback => self.send_fallback(req).await,
        }
    }

    async fn send_accelerated(&self, req: &RequestDescriptor) -> Result<Response, FetchError> {
        let options = accelerated_options(req.method.as_ref(), req.headers.as_ref(), &req.body);
        match self
            .accelerated
            .fetch_via_client(&self.client, &req.url_string, options)
            .await
        {
            Ok(raw) => Ok(Response::from_transport(raw)),
            Err(e) => {
                log::debug!("[{}] accelerated transport failed: {}", req.id, e);
                Err(map_transport_error(e))
            }
        }
    }

    async fn send_fallback(&self, req: &RequestDescriptor) -> Result<Response, FetchError> {
        let request = FallbackRequest {
            redirect: req.options.redirect,
            signal: req.options.signal.clone(),
            method: req.method.clone(),
            headers: req.headers.clone(),
            body: req.body.clone(),
        };
        match self.fallback.fetch(&req.url_string, request).await {
            Ok(raw) => Ok(Response::from_transport(raw)),
            Err(e) => {
                log::debug!("[{}] fallback transport failed: {}", req.id, e);
                Err(map_fallback_error(e, req.options.redirect))
            }
        }
    }
}
