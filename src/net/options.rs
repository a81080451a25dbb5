//! Option resolver.
//!
//! Turns the loosely-typed [`RequestInit`] into [`ResolvedOptions`], where
//! every field has a concrete value:
//!
//! | field         | default                          |
//! |---------------|----------------------------------|
//! | `redirect`    | [`RedirectMode::Follow`]         |
//! | `cache`       | [`CacheMode::Default`] (no-op)   |
//! | `credentials` | [`CredentialsMode::Omit`]        |
//! | `timeout`     | none                             |
//! | `signal`      | none                             |

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::FetchError;
use crate::net::modes::{CacheMode, CredentialsMode, RedirectMode};
use crate::net::request::RequestInit;

#[derive(Debug, Clone, Default)]
pub struct ResolvedOptions {
    pub redirect: RedirectMode,
    pub cache: CacheMode,
    pub credentials: CredentialsMode,
    pub timeout: Option<Duration>,
    pub signal: Option<CancellationToken>,
}

impl ResolvedOptions {
    /// Whether the call needs the abort/timeout race at all.
    pub fn is_raced(&self) -> bool {
        self.signal.is_some() || self.timeout.is_some()
    }
}

/// Validates `init` and fills in defaults.
///
/// Fails with [`FetchError::InvalidRedirectMode`] for unknown redirect values
/// and with [`FetchError::Aborted`] when the signal was already cancelled.
pub fn resolve_options(init: &RequestInit) -> Result<ResolvedOptions, FetchError> {
    let redirect = match init.redirect.as_deref() {
        None => RedirectMode::default(),
        Some(raw) => raw.parse()?,
    };

    if init.signal.as_ref().is_some_and(|s| s.is_cancelled()) {
        return Err(FetchError::Aborted);
    }

    Ok(ResolvedOptions {
        redirect,
        cache: init.cache.unwrap_or_default(),
        credentials: init.credentials.unwrap_or_default(),
        timeout: init.timeout,
        signal: init.signal.clone(),
    })
}
