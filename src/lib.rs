//! Browser-style fetch for Rust.
//!
//! A [`Fetcher`] reproduces the behavior of the fetch contract (request
//! construction, redirect modes, cache modes, credentialed cookies,
//! cancellation and timeouts) on top of two pluggable transports: a pooled
//! accelerated client for plain requests and a general-purpose fallback for
//! encoded bodies and non-follow redirects.
//!
//! ```no_run
//! use std::time::Duration;
//! use gosub_fetch::{CredentialsMode, Fetcher, RequestInit};
//!
//! # async fn run() -> Result<(), gosub_fetch::FetchError> {
//! let fetcher = Fetcher::new()?;
//! let res = fetcher
//!     .fetch(
//!         "https://example.com/api",
//!         RequestInit::new()
//!             .credentials(CredentialsMode::Include)
//!             .timeout(Duration::from_secs(5)),
//!     )
//!     .await?;
//! assert!(res.ok());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod net;

pub use cache::{CacheEntry, ResponseCache, ResponseCacheHandle};
pub use config::{FetchConfig, FetchConfigBuilder};
pub use cookies::{CookieJar, CookieJarHandle, OriginCookieJar};
pub use errors::{ErrorKind, FetchError};
pub use net::{
    fetch, Blob, Body, CacheMode, CredentialsMode, Fetcher, FetcherBuilder, FormData, FormValue, RedirectMode, Request,
    RequestInit, Response, ResponseInit, ResponseType,
};
