//! HTTP response model.
//!
//! [`Response`] is a **fully buffered** response: status + reason, headers
//! and the raw body bytes, plus three identity fields that record where the
//! response came from:
//!
//! - `url`: final URL after redirects (`None` for constructed or cached
//!   responses),
//! - `redirected`: whether at least one redirect was followed,
//! - `type`: [`ResponseType`] (`basic` for network responses).
//!
//! The identity fields are set once when the response is built and only
//! exposed through getters, so cloning or re-wrapping a response cannot
//! change its redirect provenance.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.
//! - Statuses 204, 205 and 304 never carry a body, whatever the transport
//!   returned.
//! - For text use [`Response::text`]; for JSON, [`Response::json`]; for
//!   `multipart/form-data` or url-encoded bodies, [`Response::form_data`].

use std::fmt;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::FetchError;
use crate::net::request::{Blob, FormData};
use crate::net::transport::TransportResponse;

/// Response type as defined by the fetch standard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Basic,
    Cors,
    #[default]
    Default,
    Error,
    Opaque,
    #[serde(rename = "opaqueredirect")]
    OpaqueRedirect,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Default => "default",
            ResponseType::Error => "error",
            ResponseType::Opaque => "opaque",
            ResponseType::OpaqueRedirect => "opaqueredirect",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status codes that never carry a body.
const NULL_BODY_STATUSES: [u16; 3] = [204, 205, 304];

pub fn is_null_body_status(status: u16) -> bool {
    NULL_BODY_STATUSES.contains(&status)
}

/// Init values for [`Response::new`].
#[derive(Debug, Clone)]
pub struct ResponseInit {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self {
            status: 200,
            status_text: String::new(),
            headers: HeaderMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    body: Bytes,

    url: Option<Url>,
    redirected: bool,
    response_type: ResponseType,
}

impl Response {
    /// Constructs a response from a body and init values. The result has type
    /// `default`, no URL and `redirected == false`.
    pub fn new(body: impl Into<Bytes>, init: ResponseInit) -> Self {
        let body = if is_null_body_status(init.status) { Bytes::new() } else { body.into() };
        Self {
            status: init.status,
            status_text: init.status_text,
            headers: init.headers,
            body,
            url: None,
            redirected: false,
            response_type: ResponseType::Default,
        }
    }

    /// Builds the caller-facing response from whatever a transport returned.
    pub(crate) fn from_transport(raw: TransportResponse) -> Self {
        let body = if is_null_body_status(raw.status) { Bytes::new() } else { raw.body };
        Self {
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            body,
            url: Some(raw.url),
            redirected: raw.redirected,
            response_type: raw.response_type,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL of the response, after redirects.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Raw body bytes. Cheap: shares the underlying buffer.
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parses the body as form fields, driven by the `Content-Type` header.
    ///
    /// `multipart/form-data` parts with a filename become file entries holding
    /// a [`Blob`]; all other parts and url-encoded pairs become text entries.
    pub async fn form_data(&self) -> Result<FormData, FetchError> {
        let content_type = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "multipart/form-data" => self.multipart_form_data(content_type).await,
            "application/x-www-form-urlencoded" => {
                let mut form = FormData::new();
                for (name, value) in url::form_urlencoded::parse(&self.body) {
                    form.append(name, value);
                }
                Ok(form)
            }
            _ => Err(FetchError::FormData(format!("unsupported content type {content_type:?}"))),
        }
    }

    async fn multipart_form_data(&self, content_type: &str) -> Result<FormData, FetchError> {
        let boundary = multer::parse_boundary(content_type)?;
        let body = self.body.clone();
        let stream = futures::stream::once(async move { Ok::<_, std::convert::Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = FormData::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let media_type = field.content_type().map(|m| m.to_string());
            let bytes = field.bytes().await?;

            match filename {
                Some(filename) => {
                    let blob = Blob { bytes, content_type: media_type };
                    form.append_file(name, blob, filename);
                }
                None => form.append(name, String::from_utf8_lossy(&bytes)),
            }
        }
        Ok(form)
    }
}
