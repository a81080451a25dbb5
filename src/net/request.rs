//! Request-side types: bodies, the options bag and the request object.
//!
//! [`RequestInit`] is the caller-facing options bag (method, headers, body,
//! redirect/cache/credentials modes, timeout, cancellation signal). It can be
//! built fluently or deserialized from a JSON options object.
//!
//! [`Request`] is a reusable request value with its own method, headers and a
//! single-use body, so it can be handed to `fetch` in place of a URL.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::{Deserialize, Deserializer};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::errors::FetchError;
use crate::net::modes::{CacheMode, CredentialsMode};

/// A unique identifier for a single fetch call, used to correlate log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary payload with an optional media type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into(), content_type: None }
    }

    pub fn with_type(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self { bytes: bytes.into(), content_type: Some(content_type.into()) }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One value inside a [`FormData`] body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File { blob: Blob, filename: String },
}

/// Ordered multipart form fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: impl Into<String>, blob: Blob, filename: impl Into<String>) {
        self.entries.push((name.into(), FormValue::File { blob, filename: filename.into() }));
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request body, one variant per body kind the dispatcher distinguishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Blob(Blob),
    /// `application/x-www-form-urlencoded` pairs, in order.
    UrlEncoded(Vec<(String, String)>),
    Multipart(FormData),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Text(_) => "text",
            Body::Blob(_) => "blob",
            Body::UrlEncoded(_) => "url-encoded",
            Body::Multipart(_) => "multipart",
        }
    }

    /// Textual rendition of the body, if it has one.
    ///
    /// Blobs decode lossily as UTF-8 and url-encoded pairs serialize to their
    /// query-string form. Multipart bodies have no textual form without a
    /// boundary, so they return `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Body::Empty => Some(String::new()),
            Body::Text(s) => Some(s.clone()),
            Body::Blob(blob) => Some(String::from_utf8_lossy(&blob.bytes).into_owned()),
            Body::UrlEncoded(pairs) => Some(serialize_url_encoded(pairs)),
            Body::Multipart(_) => None,
        }
    }
}

pub(crate) fn serialize_url_encoded(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<Blob> for Body {
    fn from(blob: Blob) -> Self {
        Body::Blob(blob)
    }
}

impl From<FormData> for Body {
    fn from(form: FormData) -> Self {
        Body::Multipart(form)
    }
}

/// Options bag passed next to the input of a fetch.
///
/// Every field is optional; the option resolver fills in defaults. `redirect`
/// stays a raw string so that invalid values are reported by the resolver
/// with the exact value the caller passed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestInit {
    #[serde(deserialize_with = "de_method")]
    pub method: Option<Method>,
    #[serde(deserialize_with = "de_headers")]
    pub headers: Option<HeaderMap>,
    #[serde(deserialize_with = "de_text_body")]
    pub body: Option<Body>,
    pub redirect: Option<String>,
    pub cache: Option<CacheMode>,
    pub credentials: Option<CredentialsMode>,
    #[serde(deserialize_with = "de_millis")]
    pub timeout: Option<Duration>,
    #[serde(skip)]
    pub signal: Option<CancellationToken>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn map(mut self, f: impl FnOnce(&mut RequestInit)) -> Self {
        f(&mut self);
        self
    }

    pub fn method(self, method: Method) -> Self { self.map(|i| i.method = Some(method)) }
    pub fn headers(self, headers: HeaderMap) -> Self { self.map(|i| i.headers = Some(headers)) }
    pub fn body(self, body: impl Into<Body>) -> Self { self.map(|i| i.body = Some(body.into())) }
    pub fn redirect(self, mode: impl Into<String>) -> Self { self.map(|i| i.redirect = Some(mode.into())) }
    pub fn cache(self, mode: CacheMode) -> Self { self.map(|i| i.cache = Some(mode)) }
    pub fn credentials(self, mode: CredentialsMode) -> Self { self.map(|i| i.credentials = Some(mode)) }
    pub fn timeout(self, timeout: Duration) -> Self { self.map(|i| i.timeout = Some(timeout)) }
    pub fn signal(self, signal: CancellationToken) -> Self { self.map(|i| i.signal = Some(signal)) }

    /// Adds a single header. Invalid names or values are ignored.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.map(|i| {
            let parsed = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value));
            match parsed {
                (Ok(name), Ok(value)) => {
                    i.headers.get_or_insert_with(HeaderMap::new).append(name, value);
                }
                _ => log::warn!("ignoring invalid header {name:?}"),
            }
        })
    }
}

fn de_method<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Method>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    raw.map(|m| Method::from_bytes(m.as_bytes()).map_err(serde::de::Error::custom))
        .transpose()
}

fn de_headers<'de, D: Deserializer<'de>>(d: D) -> Result<Option<HeaderMap>, D::Error> {
    let raw: Option<std::collections::BTreeMap<String, String>> = Option::deserialize(d)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut map = HeaderMap::with_capacity(raw.len());
    for (k, v) in raw {
        let name = HeaderName::from_bytes(k.as_bytes()).map_err(serde::de::Error::custom)?;
        let value = HeaderValue::from_str(&v).map_err(serde::de::Error::custom)?;
        map.append(name, value);
    }
    Ok(Some(map))
}

fn de_text_body<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Body>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.map(Body::Text))
}

fn de_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    let raw: Option<u64> = Option::deserialize(d)?;
    Ok(raw.map(Duration::from_millis))
}

/// A request value that can be passed to `fetch` instead of a URL.
///
/// The body is single-use: once read (by [`Request::text`] or by a fetch that
/// adopts it) it is gone and `body_used()` reports `true`.
#[derive(Debug)]
pub struct Request {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Body>,
    body_used: bool,
}

impl Request {
    /// Builds a request from a URL and an options bag. Only method, headers
    /// and body are taken from `init`; the URL is validated when fetched.
    pub fn new(url: impl Into<String>, init: RequestInit) -> Self {
        Self {
            url: url.into(),
            method: init.method.unwrap_or(Method::GET),
            headers: init.headers.unwrap_or_default(),
            body: init.body.filter(|b| !b.is_empty()),
            body_used: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body_used(&self) -> bool {
        self.body_used
    }

    /// Reads the body as text, consuming it.
    pub fn text(&mut self) -> Result<String, FetchError> {
        if self.body_used {
            return Err(FetchError::BodyUsed);
        }
        let Some(body) = self.take_body() else {
            return Ok(String::new());
        };
        body.to_text().ok_or_else(|| {
            FetchError::InvalidRequest("multipart body cannot be read as text".to_string())
        })
    }

    pub(crate) fn take_body(&mut self) -> Option<Body> {
        let body = self.body.take();
        if body.is_some() {
            self.body_used = true;
        }
        body
    }

    pub(crate) fn into_parts(self) -> (String, Method, HeaderMap) {
        (self.url, self.method, self.headers)
    }
}

/// Anything `fetch` accepts as its first argument.
#[derive(Debug)]
pub enum RequestInput {
    Url(String),
    Request(Request),
}

impl From<&str> for RequestInput {
    fn from(s: &str) -> Self {
        RequestInput::Url(s.to_string())
    }
}

impl From<String> for RequestInput {
    fn from(s: String) -> Self {
        RequestInput::Url(s)
    }
}

impl From<&String> for RequestInput {
    fn from(s: &String) -> Self {
        RequestInput::Url(s.clone())
    }
}

impl From<Url> for RequestInput {
    fn from(url: Url) -> Self {
        RequestInput::Url(url.into())
    }
}

impl From<&Url> for RequestInput {
    fn from(url: &Url) -> Self {
        RequestInput::Url(url.as_str().to_string())
    }
}

impl From<Request> for RequestInput {
    fn from(req: Request) -> Self {
        RequestInput::Request(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_deserializes_from_json_options() {
        let init: RequestInit = serde_json::from_str(
            r#"{
                "method": "POST",
                "headers": { "X-Test": "hello" },
                "body": "abc",
                "redirect": "manual",
                "cache": "force-cache",
                "credentials": "include",
                "timeout": 50
            }"#,
        )
        .unwrap();

        assert_eq!(init.method, Some(Method::POST));
        assert_eq!(init.headers.as_ref().unwrap()["x-test"], "hello");
        assert_eq!(init.body, Some(Body::Text("abc".into())));
        assert_eq!(init.redirect.as_deref(), Some("manual"));
        assert_eq!(init.cache, Some(CacheMode::ForceCache));
        assert_eq!(init.credentials, Some(CredentialsMode::Include));
        assert_eq!(init.timeout, Some(Duration::from_millis(50)));
        assert!(init.signal.is_none());
    }

    #[test]
    fn init_keeps_unknown_redirect_values_for_the_resolver() {
        let init: RequestInit = serde_json::from_str(r#"{ "redirect": "sideways" }"#).unwrap();
        assert_eq!(init.redirect.as_deref(), Some("sideways"));
    }

    #[test]
    fn header_builder_appends_case_insensitively() {
        let init = RequestInit::new().header("X-One", "1").header("x-two", "2");
        let headers = init.headers.unwrap();
        assert_eq!(headers["x-one"], "1");
        assert_eq!(headers["X-TWO"], "2");
    }

    #[test]
    fn request_body_is_single_use() {
        let mut req = Request::new(
            "http://example.com/echo",
            RequestInit::new().method(Method::POST).body("abc"),
        );
        assert_eq!(req.method(), Method::POST);
        assert!(req.has_body());
        assert!(!req.body_used());
        assert_eq!(req.text().unwrap(), "abc");
        assert!(!req.has_body());
        assert!(req.body_used());
        assert!(matches!(req.text(), Err(FetchError::BodyUsed)));

        let empty = Request::new("http://example.com/", RequestInit::new());
        assert!(!empty.has_body());
    }

    #[test]
    fn body_text_renditions() {
        let pairs = Body::UrlEncoded(vec![
            ("foo".into(), "bar".into()),
            ("baz".into(), "a b".into()),
        ]);
        assert_eq!(pairs.to_text().unwrap(), "foo=bar&baz=a+b");

        let blob = Body::Blob(Blob::with_type(&b"hello"[..], "text/plain"));
        assert_eq!(blob.to_text().unwrap(), "hello");

        let mut form = FormData::new();
        form.append("a", "1");
        assert!(Body::Multipart(form).to_text().is_none());
    }

    #[test]
    fn request_id_is_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
