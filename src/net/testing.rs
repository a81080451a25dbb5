//! In-process transports for unit tests.
//!
//! Both mocks count their calls and record what they were given. Clones share
//! that state, so a test can keep one clone for assertions and hand the other
//! to a [`Fetcher`](crate::net::Fetcher).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use url::Url;

use crate::net::response::ResponseType;
use crate::net::transport::{
    AcceleratedTransport, FallbackRequest, FallbackTransport, TransportError, TransportOptions,
    TransportResponse,
};

/// Produces a result from the (1-based) hit number and the target URL.
type Responder = Arc<dyn Fn(usize, &str) -> Result<TransportResponse, TransportError> + Send + Sync>;

pub fn raw_response(url: &str, status: u16, body: impl Into<Bytes>) -> TransportResponse {
    TransportResponse {
        status,
        status_text: http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string(),
        headers: HeaderMap::new(),
        body: body.into(),
        url: Url::parse(url).unwrap(),
        redirected: false,
        response_type: ResponseType::Basic,
    }
}

struct Recorder<T> {
    hits: AtomicUsize,
    calls: Mutex<Vec<T>>,
}

impl<T: Clone> Recorder<T> {
    fn new() -> Self {
        Self { hits: AtomicUsize::new(0), calls: Mutex::new(Vec::new()) }
    }

    fn record(&self, call: T) -> usize {
        self.calls.lock().unwrap().push(call);
        self.hits.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn last(&self) -> Option<T> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[derive(Clone)]
pub struct MockAccelerated {
    recorder: Arc<Recorder<Option<TransportOptions>>>,
    clients: Arc<AtomicUsize>,
    responder: Responder,
    delay: Option<Duration>,
}

impl MockAccelerated {
    pub fn new(responder: impl Fn(usize, &str) -> Result<TransportResponse, TransportError> + Send + Sync + 'static) -> Self {
        Self {
            recorder: Arc::new(Recorder::new()),
            clients: Arc::new(AtomicUsize::new(0)),
            responder: Arc::new(responder),
            delay: None,
        }
    }

    /// Always answers `status` with `body`.
    pub fn ok(status: u16, body: &'static str) -> Self {
        Self::new(move |_, url| Ok(raw_response(url, status, body)))
    }

    /// Answers 200 with `hit-N`, N being the call count.
    pub fn counting() -> Self {
        Self::new(|hit, url| Ok(raw_response(url, 200, format!("hit-{hit}"))))
    }

    pub fn failing(err: impl Fn() -> TransportError + Send + Sync + 'static) -> Self {
        Self::new(move |_, _| Err(err()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn hits(&self) -> usize {
        self.recorder.hits.load(Ordering::SeqCst)
    }

    pub fn clients_created(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    /// Options passed on the most recent call.
    pub fn last_options(&self) -> Option<TransportOptions> {
        self.recorder.last().flatten()
    }

    /// Whether the most recent call was made with no options at all.
    pub fn last_call_had_no_options(&self) -> bool {
        matches!(self.recorder.last(), Some(None))
    }
}

impl AcceleratedTransport for MockAccelerated {
    type Client = ();

    fn create_client(&self) -> Result<(), TransportError> {
        self.clients.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_via_client(
        &self,
        _client: &(),
        url: &str,
        options: Option<TransportOptions>,
    ) -> Result<TransportResponse, TransportError> {
        let hit = self.recorder.record(options);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(hit, url)
    }
}

#[derive(Clone)]
pub struct MockFallback {
    recorder: Arc<Recorder<FallbackRequest>>,
    responder: Responder,
}

impl MockFallback {
    pub fn new(responder: impl Fn(usize, &str) -> Result<TransportResponse, TransportError> + Send + Sync + 'static) -> Self {
        Self { recorder: Arc::new(Recorder::new()), responder: Arc::new(responder) }
    }

    pub fn ok(status: u16, body: &'static str) -> Self {
        Self::new(move |_, url| Ok(raw_response(url, status, body)))
    }

    pub fn failing(err: impl Fn() -> TransportError + Send + Sync + 'static) -> Self {
        Self::new(move |_, _| Err(err()))
    }

    pub fn hits(&self) -> usize {
        self.recorder.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<FallbackRequest> {
        self.recorder.last()
    }
}

impl FallbackTransport for MockFallback {
    async fn fetch(&self, url: &str, request: FallbackRequest) -> Result<TransportResponse, TransportError> {
        let hit = self.recorder.record(request);
        (self.responder)(hit, url)
    }
}
