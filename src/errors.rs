use std::time::Duration;

use crate::net::transport::TransportError;

/// Errors surfaced to callers of [`Fetcher::fetch`](crate::net::Fetcher::fetch).
///
/// The display strings are part of the contract: callers pattern-match on
/// them (`"cache miss"`, `"redirect error"`, `"ECONNREFUSED"`, ...), so they
/// must stay stable.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported protocol")]
    UnsupportedProtocol { scheme: String },

    #[error("Invalid redirect option: {0}")]
    InvalidRedirectMode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Body is unusable: body has already been read")]
    BodyUsed,

    #[error("cache miss")]
    CacheMiss { url: String },

    #[error("redirect error")]
    Redirect {
        #[source]
        source: TransportError,
    },

    #[error("ECONNREFUSED")]
    ConnectionRefused(#[source] TransportError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("The operation was aborted")]
    Aborted,

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Could not parse content as FormData: {0}")]
    FormData(String),

    #[error("Failed to parse multipart body: {0}")]
    Multipart(#[from] multer::Error),

    #[error("HTTP client is unavailable: {0}")]
    ClientUnavailable(String),

    #[error("Internal fetch error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad URL, scheme, redirect value, method or header. Raised before dispatch.
    Input,
    /// `only-if-cached` found nothing.
    CacheMiss,
    /// Network-level failure from either transport.
    Transport,
    /// A redirect happened while `redirect` was set to `error`.
    RedirectPolicy,
    Timeout,
    Abort,
    /// Reading or decoding a body failed.
    Body,
    Internal,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl(_)
            | FetchError::UnsupportedProtocol { .. }
            | FetchError::InvalidRedirectMode(_)
            | FetchError::InvalidRequest(_) => ErrorKind::Input,
            FetchError::CacheMiss { .. } => ErrorKind::CacheMiss,
            FetchError::ConnectionRefused(_) | FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::Redirect { .. } => ErrorKind::RedirectPolicy,
            FetchError::Timeout(_) => ErrorKind::Timeout,
            FetchError::Aborted => ErrorKind::Abort,
            FetchError::BodyUsed
            | FetchError::Decode(_)
            | FetchError::FormData(_)
            | FetchError::Multipart(_) => ErrorKind::Body,
            FetchError::ClientUnavailable(_) | FetchError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_abort(&self) -> bool {
        self.kind() == ErrorKind::Abort
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}
