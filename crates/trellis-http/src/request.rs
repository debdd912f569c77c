//! HTTP request type.
//!
//! [`HttpRequest`] carries what the dispatch pipeline needs from an inbound
//! request: the method, the routing path (decoded, base URL stripped, leading
//! slash normalized), headers, server metadata, the body, and the parsed route
//! parameters once the router has run.

use std::collections::HashMap;

use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;

use crate::routing::params::ParsedParams;

/// An inbound HTTP request.
///
/// Instances are created from an incoming Axum request via
/// [`HttpRequest::from_axum`], or with [`HttpRequest::builder`] for internal
/// sub-requests and tests.
///
/// # Examples
///
/// ```
/// use trellis_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("users/view/3")
///     .query_string("tab=orders")
///     .build();
///
/// assert_eq!(request.path(), "/users/view/3");
/// assert_eq!(request.query("tab").as_deref(), Some("orders"));
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    meta: HashMap<String, String>,
    body: Vec<u8>,
    params: Option<ParsedParams>,
    return_body: bool,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`] for constructing an `HttpRequest`.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from an Axum/hyper request and its body bytes.
    ///
    /// The routing path is computed from the URI path with
    /// [`routing_path`], using `base_url` as the mount prefix.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>, base_url: &str) -> Self {
        let method = parts.method;
        let uri = parts.uri;
        let headers = parts.headers;

        let raw_path = uri.path().to_string();
        let query_string = uri.query().unwrap_or("").to_string();

        let mut meta = HashMap::new();
        for (name, value) in &headers {
            let meta_key = format!("HTTP_{}", name.as_str().to_uppercase().replace('-', "_"));
            if let Ok(v) = value.to_str() {
                meta.insert(meta_key, v.to_string());
            }
        }
        if let Some(host) = headers.get(http::header::HOST).and_then(|v| v.to_str().ok()) {
            meta.insert("SERVER_NAME".to_string(), host.to_string());
        }
        meta.insert("REQUEST_METHOD".to_string(), method.to_string());
        meta.insert("REQUEST_URI".to_string(), raw_path.clone());
        meta.insert("QUERY_STRING".to_string(), query_string.clone());
        meta.insert("CONTENT_LENGTH".to_string(), body.len().to_string());

        Self {
            method,
            path: routing_path(&raw_path, base_url),
            query_string,
            headers,
            meta,
            body,
            params: None,
            return_body: false,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the routing path. Always starts with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the first value of a query parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query_string.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the server metadata (`REQUEST_URI`, `HTTP_*` headers, ...).
    pub const fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the parsed route parameters, once the router has run.
    pub const fn params(&self) -> Option<&ParsedParams> {
        self.params.as_ref()
    }

    /// Attaches the parsed route parameters.
    pub fn set_params(&mut self, params: ParsedParams) {
        self.params = Some(params);
    }

    /// Returns `true` if the caller wants the response body back instead of
    /// a full HTTP response (internal sub-requests).
    pub const fn wants_body_only(&self) -> bool {
        self.return_body
    }
}

/// Computes the routing path from a raw request URI path.
///
/// Percent-decodes the path, strips the application's `base_url` mount prefix
/// and guarantees a single leading slash.
///
/// ```
/// use trellis_http::request::routing_path;
///
/// assert_eq!(routing_path("/app/users/view%2Fall", "/app"), "/users/view/all");
/// assert_eq!(routing_path("/app", "/app/"), "/");
/// assert_eq!(routing_path("users", ""), "/users");
/// ```
pub fn routing_path(raw: &str, base_url: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let base = base_url.trim_end_matches('/');

    let stripped = if base.is_empty() {
        decoded.as_ref()
    } else {
        match decoded.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => decoded.as_ref(),
        }
    };

    format!("/{}", stripped.trim_start_matches('/'))
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    meta: HashMap<String, String>,
    body: Vec<u8>,
    return_body: bool,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            meta: HashMap::new(),
            body: Vec::new(),
            return_body: false,
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the routing path. A leading slash is added if missing.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = routing_path(path, "");
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Adds a META entry.
    #[must_use]
    pub fn meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Marks the request as a sub-request whose body is returned to the caller.
    #[must_use]
    pub const fn return_body(mut self, return_body: bool) -> Self {
        self.return_body = return_body;
        self
    }

    /// Builds the `HttpRequest`.
    pub fn build(self) -> HttpRequest {
        let mut meta = self.meta;
        meta.entry("REQUEST_METHOD".to_string())
            .or_insert_with(|| self.method.to_string());
        meta.entry("REQUEST_URI".to_string())
            .or_insert_with(|| self.path.clone());

        HttpRequest {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            headers: self.headers,
            meta,
            body: self.body,
            params: None,
            return_body: self.return_body,
        }
    }
}
