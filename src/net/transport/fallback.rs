use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};
use reqwest::multipart;
use url::Url;

use crate::config::FetchConfig;
use crate::net::modes::RedirectMode;
use crate::net::request::{serialize_url_encoded, Body, FormData, FormValue};
use crate::net::response::ResponseType;
use crate::net::transport::reqwest_client::client_builder;
use crate::net::transport::{
    follow_policy, status_text, FallbackRequest, FallbackTransport, TransportError,
    TransportErrorKind, TransportResponse,
};

const URL_ENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// General-purpose fallback transport.
///
/// Encodes blob, url-encoded and multipart bodies itself and implements all
/// three redirect modes. It keeps two pooled clients: one that follows
/// redirects (with the shared hop limit) and one that never does, used for
/// `manual` and `error`.
#[derive(Debug, Clone)]
pub struct ReqwestFallback {
    following: reqwest::Client,
    non_following: reqwest::Client,
}

impl ReqwestFallback {
    pub fn new(config: &FetchConfig) -> Result<Self, TransportError> {
        let following = client_builder(config)
            .redirect(follow_policy(config.max_redirects))
            .build()?;
        let non_following = client_builder(config)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { following, non_following })
    }

    fn client_for(&self, mode: RedirectMode) -> &reqwest::Client {
        match mode {
            RedirectMode::Follow => &self.following,
            RedirectMode::Manual | RedirectMode::Error => &self.non_following,
        }
    }

    async fn send(&self, url: &str, request: FallbackRequest) -> Result<TransportResponse, TransportError> {
        let FallbackRequest { redirect, method, headers, body, .. } = request;
        let mut headers = headers.unwrap_or_default();
        let method = method.unwrap_or(http::Method::GET);

        let mut req = self.client_for(redirect).request(method, url);
        req = match body {
            Body::Empty => req,
            Body::Text(text) => req.body(text),
            Body::Blob(blob) => {
                if let Some(ct) = blob.content_type.as_deref() {
                    set_default_content_type(&mut headers, ct);
                }
                req.body(blob.bytes)
            }
            Body::UrlEncoded(pairs) => {
                set_default_content_type(&mut headers, URL_ENCODED_CONTENT_TYPE);
                req.body(serialize_url_encoded(&pairs))
            }
            Body::Multipart(form) => {
                // The boundary is chosen here, so a caller-provided type can't be right
                headers.remove(CONTENT_TYPE);
                req.multipart(to_multipart(form)?)
            }
        };
        let resp = req.headers(headers).send().await?;

        let status = resp.status();
        if redirect == RedirectMode::Error && is_redirect(status, resp.headers()) {
            return Err(TransportError::new(
                TransportErrorKind::Redirect,
                format!("unexpected redirect ({status}) while redirect mode is 'error'"),
            ));
        }

        let headers = resp.headers().clone();
        let final_url = resp.url().clone();
        let redirected = Url::parse(url).map_or(true, |requested| requested != final_url);
        let body = resp.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status_text(status),
            headers,
            body,
            url: final_url,
            redirected,
            response_type: ResponseType::Basic,
        })
    }
}

impl FallbackTransport for ReqwestFallback {
    async fn fetch(&self, url: &str, request: FallbackRequest) -> Result<TransportResponse, TransportError> {
        let Some(signal) = request.signal.clone() else {
            return self.send(url, request).await;
        };
        tokio::select! {
            _ = signal.cancelled() => Err(TransportError::new(
                TransportErrorKind::Aborted,
                "The operation was aborted",
            )),
            res = self.send(url, request) => res,
        }
    }
}

/// Statuses a following client would act on. Other 3xx codes (300, 304,
/// 305, 306) and redirect codes without a `Location` are plain responses.
const REDIRECT_STATUSES: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

fn is_redirect(status: StatusCode, headers: &HeaderMap) -> bool {
    REDIRECT_STATUSES.contains(&status) && headers.contains_key(LOCATION)
}

fn set_default_content_type(headers: &mut HeaderMap, value: &str) {
    if headers.contains_key(CONTENT_TYPE) {
        return;
    }
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(CONTENT_TYPE, v);
        }
        Err(_) => log::warn!("ignoring invalid content type {value:?}"),
    }
}

fn to_multipart(form: FormData) -> Result<multipart::Form, TransportError> {
    let mut out = multipart::Form::new();
    for (name, value) in form.entries().iter().cloned() {
        out = match value {
            FormValue::Text(text) => out.text(name, text),
            FormValue::File { blob, filename } => {
                let mut part = multipart::Part::bytes(blob.bytes.to_vec()).file_name(filename);
                if let Some(ct) = blob.content_type.as_deref() {
                    part = part.mime_str(ct)?;
                }
                out.part(name, part)
            }
        };
    }
    Ok(out)
}
