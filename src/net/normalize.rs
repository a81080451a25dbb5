//! Input normalizer.
//!
//! Reduces whatever was handed to `fetch` (a URL string or a [`Request`]) to
//! one absolute `http`/`https` URL plus the method, headers and body that
//! should go on the wire.

use http::{HeaderMap, Method};
use url::Url;

use crate::errors::FetchError;
use crate::net::request::{Body, Request, RequestInit, RequestInput};

/// Canonical form of the call input.
#[derive(Debug)]
pub struct NormalizedInput {
    /// Parsed target URL.
    pub url: Url,
    /// The URL exactly as the caller spelled it. Used as cache key.
    pub url_string: String,
    /// Method, only when one was supplied.
    pub method: Option<Method>,
    /// Headers, only when some were supplied.
    pub headers: Option<HeaderMap>,
    pub body: Body,
}

/// Normalizes `input`, taking method/headers/body out of `init` where given.
///
/// A [`Request`] contributes its method and headers unless `init` overrides
/// them, and its unread body when `init` supplied none.
pub fn normalize_input(input: RequestInput, init: &mut RequestInit) -> Result<NormalizedInput, FetchError> {
    let mut method = init.method.take();
    let mut headers = init.headers.take();
    let mut body = init.body.take().filter(|b| !b.is_empty());

    let url_string = match input {
        RequestInput::Url(url) => url,
        RequestInput::Request(mut req) => {
            if body.is_none() {
                body = adopt_body(&mut req);
            }
            let (url, req_method, req_headers) = req.into_parts();
            method.get_or_insert(req_method);
            headers.get_or_insert(req_headers);
            url
        }
    };

    let url = parse_target_url(&url_string)?;

    Ok(NormalizedInput {
        url,
        url_string,
        method,
        headers,
        body: body.unwrap_or_default(),
    })
}

/// Parses `raw` as an absolute URL and restricts the scheme to http(s).
pub fn parse_target_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::UnsupportedProtocol { scheme: other.to_string() }),
    }
}

fn adopt_body(req: &mut Request) -> Option<Body> {
    if req.body_used() {
        return None;
    }
    // Non-text kinds keep their variant so the dispatcher still routes them
    // to the fallback transport.
    req.take_body()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::request::Blob;

    #[test]
    fn plain_url_passes_through_untouched() {
        let mut init = RequestInit::new();
        let n = normalize_input("http://example.com/a?b=c".into(), &mut init).unwrap();
        assert_eq!(n.url_string, "http://example.com/a?b=c");
        assert_eq!(n.url.path(), "/a");
        assert!(n.method.is_none());
        assert!(n.headers.is_none());
        assert!(n.body.is_empty());
    }

    #[test]
    fn cache_key_is_the_literal_string() {
        let mut init = RequestInit::new();
        let n = normalize_input("http://example.com".into(), &mut init).unwrap();
        // Url normalizes to a trailing slash, the key does not
        assert_eq!(n.url.as_str(), "http://example.com/");
        assert_eq!(n.url_string, "http://example.com");
    }

    #[test]
    fn rejects_relative_and_garbage_urls() {
        for raw in ["/relative/path", "not a url", ""] {
            let err = parse_target_url(raw).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid URL: {raw}"));
        }
    }

    #[test]
    fn rejects_non_http_schemes() {
        for raw in ["ftp://example.com/resource", "file:///etc/hosts", "data:text/plain,hi"] {
            let err = parse_target_url(raw).unwrap_err();
            assert!(matches!(err, FetchError::UnsupportedProtocol { .. }), "{raw}");
            assert_eq!(err.to_string(), "unsupported protocol");
        }
    }

    #[test]
    fn request_contributes_method_headers_and_body() {
        let req = Request::new(
            "http://example.com/echo",
            RequestInit::new().method(Method::POST).header("X-Test", "hello").body("abc"),
        );
        let mut init = RequestInit::new();
        let n = normalize_input(req.into(), &mut init).unwrap();

        assert_eq!(n.method, Some(Method::POST));
        assert_eq!(n.headers.unwrap()["x-test"], "hello");
        assert_eq!(n.body, Body::Text("abc".into()));
    }

    #[test]
    fn init_overrides_request_fields() {
        let req = Request::new(
            "http://example.com/echo",
            RequestInit::new().method(Method::POST).header("X-Test", "from-request").body("abc"),
        );
        let mut init = RequestInit::new()
            .method(Method::PUT)
            .header("X-Other", "from-init")
            .body("xyz");
        let n = normalize_input(req.into(), &mut init).unwrap();

        assert_eq!(n.method, Some(Method::PUT));
        let headers = n.headers.unwrap();
        assert!(headers.get("x-test").is_none());
        assert_eq!(headers["x-other"], "from-init");
        assert_eq!(n.body, Body::Text("xyz".into()));
    }

    #[test]
    fn consumed_request_body_is_not_adopted() {
        let mut req = Request::new("http://example.com/", RequestInit::new().body("abc"));
        req.text().unwrap();
        let mut init = RequestInit::new();
        let n = normalize_input(req.into(), &mut init).unwrap();
        assert!(n.body.is_empty());
    }

    #[test]
    fn non_text_request_bodies_keep_their_kind() {
        let req = Request::new(
            "http://example.com/",
            RequestInit::new().body(Blob::with_type(&b"x"[..], "text/plain")),
        );
        let mut init = RequestInit::new();
        let n = normalize_input(req.into(), &mut init).unwrap();
        assert_eq!(n.body.kind(), "blob");
    }
}
