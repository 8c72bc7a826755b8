//! # HTTP Response
//!
//! The outbound message being built while a request moves through
//! middleware and the handler. Anything other than `200 OK` stops the
//! pipeline; [`Response::finalize`] is the terminal step.
//!
//! Headers may repeat. `Set-Cookie` is always appended, so every cookie
//! set while handling a request reaches the client.

use crate::fault::write_fault;
use crate::view::View;
use cookie::time::Duration;
use cookie::Cookie;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{GetAll, HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use hyper::StatusCode;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

pub use cookie::SameSite;

/// Body written for faults when running in production mode
pub const GENERIC_FAULT_MESSAGE: &str = "Internal server error occurred, please try again later.";

/// Attributes of a cookie sent with [`Response::set_cookie`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Lifetime in seconds; `None` is a session cookie
    pub max_age: Option<i64>,
    /// Path scope (default: `/`)
    pub path: String,
    /// Domain scope; `None` leaves it to the request host
    pub domain: Option<String>,
    /// Only send over HTTPS
    pub secure: bool,
    /// Hide from scripts (default: on)
    pub http_only: bool,
    /// Cross-site policy (default: `Strict`)
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: None,
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: true,
            same_site: SameSite::Strict,
        }
    }
}

/// Response under construction
#[derive(Clone)]
pub struct Response {
    status: StatusCode,
    body: String,
    content_type: String,
    headers: HeaderMap,
    view: Option<Arc<dyn View>>,
    finalized: bool,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("body", &self.body)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("view", &self.view)
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: String::new(),
            content_type: "text/html; charset=utf-8".to_string(),
            headers: HeaderMap::new(),
            view: None,
            finalized: false,
        }
    }
}

impl Response {
    /// Empty `200 OK` response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "text/plain".to_string(),
            ..Self::default()
        }
    }

    /// Create a JSON response from any serializable value
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `value` cannot be encoded.
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            body: serde_json::to_string(value)?,
            content_type: "application/json".to_string(),
            ..Self::default()
        })
    }

    /// Current status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set status code
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Set status code (builder form)
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Whether the pipeline may continue past this response
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Append text to the body
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.body.push_str(text);
        self
    }

    /// Append text and a line break (`<br/>` or `\n`)
    pub fn write_line(&mut self, text: &str, use_html_br: bool) -> &mut Self {
        self.body.push_str(text);
        self.body.push_str(if use_html_br { "<br/>" } else { "\n" });
        self
    }

    /// Body accumulated so far
    #[must_use]
    pub fn content(&self) -> &str {
        &self.body
    }

    /// Clear the body
    pub fn wipe_content(&mut self) -> &mut Self {
        self.body.clear();
        self
    }

    /// Content type sent with the body
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Set or override a header
    ///
    /// `Set-Cookie` is appended instead of replaced. Names or values that
    /// are not valid in HTTP are dropped with a warning.
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type = value.to_string();
            return self;
        }

        let Some((name, value)) = header_pair(key, value) else {
            return self;
        };
        if name == SET_COOKIE {
            self.headers.append(name, value);
        } else {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a header, keeping existing values of the same name
    pub fn append_header(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some((name, value)) = header_pair(key, value) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set header (builder form)
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    /// Remove every value of a header
    pub fn remove_header(&mut self, key: &str) -> &mut Self {
        self.headers.remove(key);
        self
    }

    /// First value of a header (case-insensitive)
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        if key.eq_ignore_ascii_case("content-type") {
            return Some(&self.content_type);
        }
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// Every value of a header, in insertion order
    #[must_use]
    pub fn header_all(&self, key: &str) -> GetAll<'_, HeaderValue> {
        self.headers.get_all(key)
    }

    /// All headers except the content type
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Send a cookie
    pub fn set_cookie(&mut self, name: &str, value: &str, options: &CookieOptions) -> &mut Self {
        let mut builder = Cookie::build((name.to_string(), value.to_string()))
            .path(options.path.clone())
            .secure(options.secure)
            .http_only(options.http_only)
            .same_site(options.same_site);
        if let Some(seconds) = options.max_age {
            builder = builder.max_age(Duration::seconds(seconds));
        }
        if let Some(domain) = &options.domain {
            builder = builder.domain(domain.clone());
        }

        self.add_cookie(&builder.build())
    }

    /// Send a prepared cookie
    pub fn add_cookie(&mut self, cookie: &Cookie<'_>) -> &mut Self {
        self.set_header(SET_COOKIE.as_str(), &cookie.to_string())
    }

    /// Tell the client to drop a cookie set on path `/`
    pub fn remove_cookie(&mut self, name: &str) -> &mut Self {
        let mut cookie = Cookie::build((name.to_string(), String::new())).path("/").build();
        cookie.make_removal();
        self.add_cookie(&cookie)
    }

    /// Attach a view rendered on finalize
    pub fn set_view(&mut self, view: Arc<dyn View>) -> &mut Self {
        self.view = Some(view);
        self
    }

    /// Attached view, if any
    #[must_use]
    pub fn view(&self) -> Option<&Arc<dyn View>> {
        self.view.as_ref()
    }

    /// Whether [`Response::finalize`] already ran
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Render the attached view into the body and close the response
    ///
    /// A view that fails to render is a fault: the response becomes a 500
    /// carrying the generic message in production and the render error
    /// otherwise. Finalizing twice is a no-op.
    #[must_use]
    pub fn finalize(mut self, is_production: bool) -> Self {
        if self.finalized {
            return self;
        }

        if let Some(view) = self.view.take() {
            match view.render() {
                Ok(html) => self.body.push_str(&html),
                Err(e) => {
                    error!(view = view.name(), error = %e, "View render failed");
                    write_fault(&mut self, &e.to_string(), is_production);
                }
            }
        }

        self.finalized = true;
        self
    }

    /// Convert to hyper Response
    ///
    /// Responses leaving through the transport are already finalized by the
    /// dispatcher; anything that is not is finalized in production mode.
    pub(crate) fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let response = self.finalize(true);
        let mut builder = hyper::Response::builder()
            .status(response.status)
            .header(hyper::header::CONTENT_TYPE, &response.content_type);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers);
        }

        builder
            .body(Full::new(Bytes::from(response.body)))
            .unwrap_or_else(|_| {
                let mut fallback = hyper::Response::new(Full::new(Bytes::from(GENERIC_FAULT_MESSAGE)));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

fn header_pair(key: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    match (
        HeaderName::from_bytes(key.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => Some((name, value)),
        _ => {
            warn!(header = key, "Dropped invalid response header");
            None
        }
    }
}
