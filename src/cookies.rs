//! Cookies: [`CookieJar`] and the origin-keyed [`OriginCookieJar`].
//!
//! # Concurrency model
//! - [`CookieJarHandle`] is `Arc<RwLock<dyn CookieJar + Send + Sync>>`.
//!   - Callers take a **read lock** to build the `Cookie` request header and a
//!     **write lock** to store `Set-Cookie` values from a response.
//!   - Locks are never held across an `await`, so concurrent fetches to the
//!     same origin resolve as last-write-wins.
//!
//! # Typical usage
//! ```ignore
//! let jar = fetcher.cookie_jar(); // -> CookieJarHandle
//! let cookie_header = jar.read().unwrap().get_request_cookies(&url);
//!
//! jar.write().unwrap().store_response_cookies(&url, &headers);
//! ```

mod cookie_jar;

use std::sync::{Arc, RwLock};

pub use cookie_jar::CookieJar;
pub use cookie_jar::OriginCookieJar;

/// A handle to a cookie jar trait.
///
/// This is a reference-counted, read/write-locked pointer to a type-erased
/// [`CookieJar`]. Obtain a **read lock** for queries and a **write lock** for
/// mutations.
pub type CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>;

impl From<OriginCookieJar> for CookieJarHandle {
    fn from(jar: OriginCookieJar) -> Self {
        Arc::new(RwLock::new(jar))
    }
}
