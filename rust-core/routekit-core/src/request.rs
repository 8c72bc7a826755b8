//! # HTTP Request
//!
//! Normalized view of an inbound request: method, path, query parameters,
//! headers, cookies and body, plus the route it was matched to.

use crate::error::{Error, Result};
use crate::router::Method;
use cookie::Cookie;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use std::collections::HashMap;

/// Route bound to a request once it matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    /// Pattern of the matched route
    pub pattern: String,
    /// Name of the matched route, if any
    pub name: Option<String>,
}

/// HTTP request as seen by middleware and handlers
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Raw query string (e.g., "page=1&limit=10")
    query_string: Option<String>,
    /// Parsed query parameters
    query_params: HashMap<String, String>,
    /// Request headers
    headers: hyper::HeaderMap,
    /// Cookies from the `Cookie` headers
    cookies: HashMap<String, String>,
    /// Request body (collected)
    body: Option<Bytes>,
    /// Route this request matched; `None` while global middleware runs
    route: Option<MatchedRoute>,
}

impl Request {
    /// Create a request manually (for testing/internal use)
    ///
    /// `path` may carry a query string.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers_map: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Self {
        let path = path.into();
        let (path, query_string) = if let Some((p, q)) = path.split_once('?') {
            (p.to_string(), Some(q.to_string()))
        } else {
            (path, None)
        };

        let mut headers = hyper::HeaderMap::new();
        for (k, v) in headers_map {
            if let (Ok(n), Ok(v)) = (
                hyper::header::HeaderName::from_bytes(k.as_bytes()),
                hyper::header::HeaderValue::from_str(&v),
            ) {
                headers.insert(n, v);
            }
        }

        Self::from_parts(method, path, query_string, headers, body)
    }

    fn from_parts(
        method: Method,
        path: String,
        query_string: Option<String>,
        headers: hyper::HeaderMap,
        body: Option<Bytes>,
    ) -> Self {
        let query_params = parse_query_string(query_string.as_deref());
        let cookies = parse_cookies(&headers);

        Self {
            method,
            path,
            query_string,
            query_params,
            headers,
            cookies,
            body,
            route: None,
        }
    }

    /// Create from hyper request with body size limit
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedMethod` for methods outside [`Method::ALL`]
    /// and `Error::PayloadTooLarge` when the body exceeds `max_body_size`.
    pub async fn from_hyper_with_limit(
        req: hyper::Request<hyper::body::Incoming>,
        max_body_size: usize,
    ) -> Result<Self> {
        let method = Method::try_from(req.method())?;

        let uri = req.uri();
        let path = uri.path().to_string();
        let query_string = uri.query().map(String::from);

        let headers = req.headers().clone();
        if let Some(content_len) = headers
            .get(hyper::header::CONTENT_LENGTH)
            .and_then(|len| len.to_str().ok())
            .and_then(|len| len.parse::<usize>().ok())
        {
            if content_len > max_body_size {
                return Err(Error::PayloadTooLarge {
                    limit: max_body_size,
                    actual: content_len,
                });
            }
        }

        let bytes = BodyExt::collect(req.into_body()).await?.to_bytes();
        if bytes.len() > max_body_size {
            return Err(Error::PayloadTooLarge {
                limit: max_body_size,
                actual: bytes.len(),
            });
        }
        let body = if bytes.is_empty() { None } else { Some(bytes) };

        Ok(Self::from_parts(method, path, query_string, headers, body))
    }

    /// Path split by `/`, the same way route patterns are split
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').collect()
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the header is present
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Set or override a header
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            hyper::header::HeaderName::from_bytes(name.as_bytes()),
            hyper::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// Get all headers as a `HashMap`
    #[must_use]
    pub fn headers_map(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.as_str().to_string(), val.to_string()))
            })
            .collect()
    }

    /// Get a query parameter
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Get query parameters as a `HashMap`
    #[must_use]
    pub fn query_map(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Get raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Get a cookie value
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Whether the cookie is present
    #[must_use]
    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// All cookies
    #[must_use]
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Get the request body as bytes
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_ref().map(AsRef::as_ref)
    }

    /// Get the request body as string (UTF-8)
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.body_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Route the request matched, `None` for global middleware
    #[must_use]
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.route.as_ref()
    }

    pub(crate) fn bind_route(&mut self, pattern: &str, name: Option<&str>) {
        self.route = Some(MatchedRoute {
            pattern: pattern.to_string(),
            name: name.map(String::from),
        });
    }
}

/// Parse query string into `HashMap`
///
/// Handles URL decoding and duplicate keys (last value wins).
fn parse_query_string(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| {
            q.split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| {
                    let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                    (url_decode(key), url_decode(value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// URL decoding with `+` as space; undecodable input is kept as-is
fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), |d| d.into_owned())
}

fn parse_cookies(headers: &hyper::HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(hyper::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}
