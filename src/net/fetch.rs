//! The fetch facade.
//!
//! [`Fetcher::fetch`] takes a URL or a [`Request`](crate::net::Request) plus a
//! [`RequestInit`] and runs:
//!
//! 1. input normalization and option resolution (may fail before any I/O),
//! 2. the cache short-circuit for `only-if-cached` and `force-cache`,
//! 3. cookie injection for credentialed requests,
//! 4. dispatch through the accelerated or fallback transport,
//! 5. best-effort cache and cookie bookkeeping,
//!
//! all of it wrapped in the abort/timeout race when a signal or timeout was
//! given. A raced dispatch runs on its own task: an abort or timeout settles
//! the caller's future right away, while the dispatch and its bookkeeping
//! finish in the background.

use std::sync::{Arc, PoisonError};

use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};

use crate::cache::{ResponseCache, ResponseCacheHandle};
use crate::config::FetchConfig;
use crate::cookies::{CookieJarHandle, OriginCookieJar};
use crate::errors::FetchError;
use crate::net::dispatch::{Dispatcher, RequestDescriptor};
use crate::net::modes::CacheMode;
use crate::net::normalize::normalize_input;
use crate::net::options::resolve_options;
use crate::net::race::race;
use crate::net::request::{RequestId, RequestInit, RequestInput};
use crate::net::response::Response;
use crate::net::transport::{
    AcceleratedTransport, FallbackTransport, ReqwestFallback, ReqwestTransport,
};

/// Builder for a [`Fetcher`].
///
/// Without an explicit cache or cookie jar the fetcher gets fresh, empty
/// ones. Pass in shared handles to let several fetchers use the same stores.
#[derive(Default)]
pub struct FetcherBuilder {
    config: FetchConfig,
    cache: Option<ResponseCacheHandle>,
    cookie_jar: Option<CookieJarHandle>,
}

impl FetcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(mut self, cache: ResponseCacheHandle) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cookie_jar(mut self, jar: CookieJarHandle) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Builds a fetcher on the reqwest-backed transports.
    pub fn build(self) -> Result<Fetcher, FetchError> {
        let fallback = ReqwestFallback::new(&self.config)
            .map_err(|e| FetchError::ClientUnavailable(e.to_string()))?;
        let accelerated = ReqwestTransport::new(self.config.clone());
        self.build_with(accelerated, fallback)
    }

    /// Builds a fetcher on caller-provided transports.
    pub fn build_with<A, F>(self, accelerated: A, fallback: F) -> Result<Fetcher<A, F>, FetchError>
    where
        A: AcceleratedTransport,
        F: FallbackTransport,
    {
        let dispatcher = Dispatcher::new(accelerated, fallback)
            .map_err(|e| FetchError::ClientUnavailable(e.to_string()))?;

        Ok(Fetcher {
            inner: Arc::new(FetcherInner {
                dispatcher,
                cache: self.cache.unwrap_or_else(ResponseCache::handle),
                cookie_jar: self
                    .cookie_jar
                    .unwrap_or_else(|| OriginCookieJar::new().into()),
            }),
        })
    }
}

/// Browser-style fetch client. Cheap to clone; clones share the transports,
/// the response cache and the cookie jar.
pub struct Fetcher<A: AcceleratedTransport = ReqwestTransport, F = ReqwestFallback> {
    inner: Arc<FetcherInner<A, F>>,
}

impl<A: AcceleratedTransport, F> Clone for Fetcher<A, F> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

struct FetcherInner<A: AcceleratedTransport, F> {
    dispatcher: Dispatcher<A, F>,
    cache: ResponseCacheHandle,
    cookie_jar: CookieJarHandle,
}

impl Fetcher {
    /// Creates a fetcher with the default configuration.
    pub fn new() -> Result<Self, FetchError> {
        FetcherBuilder::new().build()
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::new()
    }
}

impl<A: AcceleratedTransport, F: FallbackTransport> Fetcher<A, F> {
    pub fn cache(&self) -> &ResponseCacheHandle {
        &self.inner.cache
    }

    pub fn cookie_jar(&self) -> &CookieJarHandle {
        &self.inner.cookie_jar
    }

    /// Performs a fetch.
    ///
    /// Must be called from within a tokio runtime when a signal or timeout is
    /// set, since the dispatch is then spawned onto its own task.
    pub async fn fetch(&self, input: impl Into<RequestInput>, mut init: RequestInit) -> Result<Response, FetchError> {
        let normalized = normalize_input(input.into(), &mut init)?;
        let options = resolve_options(&init)?;

        let req = RequestDescriptor {
            id: RequestId::new(),
            url: normalized.url,
            url_string: normalized.url_string,
            method: normalized.method,
            headers: normalized.headers,
            body: normalized.body,
            options,
        };
        log::debug!(
            "[{}] fetch {} (cache: {}, credentials: {}, redirect: {})",
            req.id,
            req.url_string,
            req.options.cache,
            req.options.credentials,
            req.options.redirect
        );

        if let Some(res) = self.inner.cached(&req)? {
            log::debug!("[{}] served from cache", req.id);
            return Ok(res);
        }

        if !req.options.is_raced() {
            return self.inner.dispatch(req).await;
        }

        let id = req.id;
        let signal = req.options.signal.clone();
        let timeout = req.options.timeout;
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.dispatch(req).await });

        let res = race(
            async move {
                task.await
                    .unwrap_or_else(|e| Err(FetchError::Internal(format!("dispatch task failed: {e}"))))
            },
            signal,
            timeout,
        )
        .await;
        if let Err(e) = &res {
            if e.is_abort() || e.is_timeout() {
                log::debug!("[{id}] settled early: {e}");
            }
        }
        res
    }
}

impl<A: AcceleratedTransport, F: FallbackTransport> FetcherInner<A, F> {
    /// Answers from the cache when the cache mode reads it.
    fn cached(&self, req: &RequestDescriptor) -> Result<Option<Response>, FetchError> {
        if !req.options.cache.reads_cache() {
            return Ok(None);
        }
        match (self.cache.get(&req.url_string), req.options.cache) {
            (Some(entry), _) => Ok(Some(entry.to_response())),
            (None, CacheMode::OnlyIfCached) => Err(FetchError::CacheMiss { url: req.url_string.clone() }),
            (None, _) => Ok(None),
        }
    }

    async fn dispatch(&self, mut req: RequestDescriptor) -> Result<Response, FetchError> {
        let credentialed = req.options.credentials.uses_cookie_jar();
        if credentialed {
            self.inject_cookie(&mut req);
        }

        let res = self.dispatcher.send(&req).await?;
        log::debug!("[{}] {} {}", req.id, res.status(), res.status_text());

        if req.options.cache.writes_cache() {
            self.cache.store_response(&req.url_string, &res);
        }
        if credentialed {
            let origin_url = res.url().unwrap_or(&req.url);
            self.cookie_jar
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .store_response_cookies(origin_url, res.headers());
        }

        Ok(res)
    }

    fn inject_cookie(&self, req: &mut RequestDescriptor) {
        let stored = self
            .cookie_jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_request_cookies(&req.url);
        let Some(cookie) = stored else {
            return;
        };

        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                log::trace!("[{}] sending stored cookie for {}", req.id, req.url.origin().ascii_serialization());
                req.headers.get_or_insert_with(HeaderMap::new).insert(COOKIE, value);
            }
            Err(_) => log::warn!("[{}] stored cookie is not a valid header value, not sending it", req.id),
        }
    }
}
