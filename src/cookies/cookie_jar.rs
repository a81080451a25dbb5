//! Cookie jar abstraction and a minimal in-memory implementation.
//!
//! [`OriginCookieJar`] keeps **one** `name=value` pair per origin
//! (`url.origin().ascii_serialization()`). Attributes such as `Path`,
//! `Domain`, `Expires` or `Secure` are discarded: only the token before the
//! first `;` of the response's `Set-Cookie` header is kept, and every new
//! `Set-Cookie` for the origin overwrites the previous pair.
//!
//! Because both reads and writes are keyed strictly by origin, a request to a
//! different scheme, host or port finds nothing to send.
//!
//! This module is **not** internally synchronized. Use it via a
//! [`CookieJarHandle`](crate::cookies::CookieJarHandle).

use std::collections::HashMap;

use http::header::SET_COOKIE;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Storage for cookies sent with credentialed requests.
pub trait CookieJar: Send + Sync {
    /// Stores cookies found in response `headers` for the origin of `url`.
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap);

    /// Returns the `Cookie` request header value to send for `url`, if any.
    fn get_request_cookies(&self, url: &Url) -> Option<String>;

    /// Removes all cookies from the jar.
    fn clear(&mut self);

    /// Retrieves all cookies by origin. Intended for inspection.
    fn get_all_cookies(&self) -> Vec<(Url, String)>;

    /// Removes the cookie stored for the origin of `url`.
    fn remove_cookies_for_url(&mut self, url: &Url);
}

/// Cookie jar holding a single cookie pair per origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginCookieJar {
    /// Key: origin string from `Url::origin().ascii_serialization()`.
    /// Value: the stored `name=value` pair.
    pub entries: HashMap<String, String>,
}

impl OriginCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns the `name=value` token of a `Set-Cookie` value, without attributes.
fn cookie_pair(raw: &str) -> Option<&str> {
    let pair = raw.split(';').next().unwrap_or_default().trim();
    if pair.is_empty() {
        None
    } else {
        Some(pair)
    }
}

impl CookieJar for OriginCookieJar {
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap) {
        let Some(value) = headers.get(SET_COOKIE) else {
            return;
        };
        let origin = origin_key(url);

        let Ok(raw) = value.to_str() else {
            log::warn!("ignoring non-textual Set-Cookie for {origin}");
            return;
        };
        match cookie_pair(raw) {
            Some(pair) => {
                log::trace!("storing cookie for {origin}");
                self.entries.insert(origin, pair.to_string());
            }
            None => log::warn!("ignoring empty Set-Cookie for {origin}"),
        }
    }

    fn get_request_cookies(&self, url: &Url) -> Option<String> {
        self.entries.get(&origin_key(url)).cloned()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn get_all_cookies(&self) -> Vec<(Url, String)> {
        self.entries
            .iter()
            .filter_map(|(origin, pair)| Url::parse(origin).ok().map(|url| (url, pair.clone())))
            .collect()
    }

    fn remove_cookies_for_url(&mut self, url: &Url) {
        self.entries.remove(&origin_key(url));
    }
}
