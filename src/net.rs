//! Networking: request/response models, the transports and the fetch facade.
//!
//! Most callers only need [`Fetcher`] (or the free [`fetch`] function, which
//! uses a process-wide default fetcher) together with [`RequestInit`].

pub mod dispatch;
pub mod fetch;
pub mod modes;
pub mod normalize;
pub mod options;
pub mod race;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{Fetcher, FetcherBuilder};
pub use modes::{CacheMode, CredentialsMode, RedirectMode};
pub use request::{Blob, Body, FormData, FormValue, Request, RequestId, RequestInit, RequestInput};
pub use response::{Response, ResponseInit, ResponseType};

use lazy_static::lazy_static;

use crate::errors::FetchError;

lazy_static! {
    /// Process-wide fetcher behind [`fetch`]. Its cache and cookie jar live
    /// as long as the process.
    static ref DEFAULT_FETCHER: Result<Fetcher, String> = Fetcher::new().map_err(|e| {
        log::error!("could not build the default fetcher: {e}");
        e.to_string()
    });
}

/// Returns the process-wide default fetcher.
pub fn default_fetcher() -> Result<&'static Fetcher, FetchError> {
    DEFAULT_FETCHER
        .as_ref()
        .map_err(|e| FetchError::ClientUnavailable(e.clone()))
}

/// Fetches `input` with the process-wide default fetcher.
///
/// ```no_run
/// use gosub_fetch::net::{fetch, CacheMode, RequestInit};
///
/// # async fn run() -> Result<(), gosub_fetch::errors::FetchError> {
/// let res = fetch("https://example.com/", RequestInit::new().cache(CacheMode::ForceCache)).await?;
/// println!("{} {}", res.status(), res.text());
/// # Ok(())
/// # }
/// ```
pub async fn fetch(input: impl Into<RequestInput>, init: RequestInit) -> Result<Response, FetchError> {
    default_fetcher()?.fetch(input, init).await
}
