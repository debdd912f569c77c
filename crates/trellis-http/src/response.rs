//! HTTP response types.
//!
//! This module provides [`HttpResponse`], the object a controller populates
//! during dispatch, and [`ResponseBody`]. A response starts with an unset
//! body; the dispatcher only assigns an action's return value when the body is
//! still unset after the action ran.

use std::path::Path;

use axum::response::IntoResponse;
use http::{HeaderMap, HeaderValue, StatusCode};

use trellis_core::TrellisResult;

/// The body content of an HTTP response.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body has been assigned yet.
    #[default]
    Unset,
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
}

impl ResponseBody {
    /// Returns `true` if no body has been assigned.
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Returns the body as bytes (empty when unset).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Unset => &[],
            Self::Bytes(b) => b,
            Self::Text(t) => t.as_bytes(),
        }
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Text(t) => f
                .debug_tuple("Text")
                .field(&t.chars().take(100).collect::<String>())
                .finish(),
        }
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ResponseBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// An HTTP response.
///
/// # Examples
///
/// ```
/// use trellis_http::HttpResponse;
///
/// let mut response = HttpResponse::new();
/// assert!(!response.has_body());
/// response.set_body("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body().to_text(), "Hello, World!");
/// ```
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
    charset: String,
    content_type: String,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponse {
    /// Creates a 200 OK `text/html` response with an unset body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Unset,
            charset: "utf-8".to_string(),
            content_type: "text/html".to_string(),
        }
    }

    /// Creates a response with the given status code and text body.
    pub fn with_status(status: StatusCode, body: impl Into<String>) -> Self {
        let mut response = Self::new();
        response.status = status;
        response.body = ResponseBody::Text(body.into());
        response
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, body)
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, name: http::header::HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Returns the charset.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the body.
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Returns `true` once a body has been assigned.
    pub const fn has_body(&self) -> bool {
        !self.body.is_unset()
    }

    /// Assigns the body.
    pub fn set_body(&mut self, body: impl Into<ResponseBody>) {
        self.body = body.into();
    }

    /// Consumes the response, returning its body.
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Loads a file into the body, setting `Content-Type` from the extension and
    /// `Content-Length` from the file size.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read.
    pub fn send_file(&mut self, path: &Path) -> TrellisResult<()> {
        let data = std::fs::read(path)?;

        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or("application/octet-stream", mime_from_extension);
        self.set_content_type(content_type);

        if let Ok(len) = HeaderValue::from_str(&data.len().to_string()) {
            self.headers.insert(http::header::CONTENT_LENGTH, len);
        }
        self.body = ResponseBody::Bytes(data);
        Ok(())
    }

    /// Returns the full content type header value including charset.
    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let content_type = HeaderValue::from_str(&self.full_content_type()).ok();

        let body = match self.body {
            ResponseBody::Unset => axum::body::Body::empty(),
            ResponseBody::Text(text) => axum::body::Body::from(text),
            ResponseBody::Bytes(bytes) => axum::body::Body::from(bytes),
        };

        let mut response = axum::response::Response::new(body);
        *response.status_mut() = self.status;
        if let Some(ct) = content_type {
            response.headers_mut().insert(http::header::CONTENT_TYPE, ct);
        }
        for (key, value) in &self.headers {
            response.headers_mut().insert(key, value.clone());
        }
        response
    }
}

/// Infers a MIME type from a file extension.
pub fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response_has_unset_body() {
        let resp = HttpResponse::new();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_type(), "text/html");
        assert!(!resp.has_body());
        assert!(resp.body().as_bytes().is_empty());
    }

    #[test]
    fn test_set_body_marks_body_set() {
        let mut resp = HttpResponse::new();
        resp.set_body(String::new());
        assert!(resp.has_body());
    }

    #[test]
    fn test_not_found() {
        let resp = HttpResponse::not_found("Not Found");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.body().to_text(), "Not Found");
    }

    #[test]
    fn test_send_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("site.css");
        std::fs::write(&file, "body { margin: 0 }").unwrap();

        let mut resp = HttpResponse::new();
        resp.send_file(&file).unwrap();
        assert_eq!(resp.content_type(), "text/css");
        assert_eq!(resp.headers().get(http::header::CONTENT_LENGTH).unwrap(), "18");
        assert_eq!(resp.body().to_text(), "body { margin: 0 }");
    }

    #[test]
    fn test_send_file_missing() {
        let mut resp = HttpResponse::new();
        assert!(resp.send_file(Path::new("/nonexistent/x.css")).is_err());
        assert!(!resp.has_body());
    }

    #[test]
    fn test_full_content_type() {
        let mut resp = HttpResponse::ok("x");
        assert_eq!(resp.full_content_type(), "text/html; charset=utf-8");
        resp.set_content_type("image/png");
        assert_eq!(resp.full_content_type(), "image/png");
    }

    #[test]
    fn test_into_response_with_custom_header() {
        let mut resp = HttpResponse::ok("test");
        resp.set_header(
            http::header::HeaderName::from_static("x-custom"),
            HeaderValue::from_static("custom-value"),
        );
        let axum_resp = resp.into_response();
        assert_eq!(axum_resp.status(), StatusCode::OK);
        assert_eq!(axum_resp.headers().get("x-custom").unwrap(), "custom-value");
        assert!(axum_resp
            .headers()
            .get(http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("utf-8"));
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("html"), "text/html");
        assert_eq!(mime_from_extension("JS"), "application/javascript");
        assert_eq!(mime_from_extension("woff2"), "font/woff2");
        assert_eq!(mime_from_extension("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_body_debug_truncates() {
        let body = ResponseBody::Text("x".repeat(500));
        assert!(format!("{body:?}").len() < 200);
        assert_eq!(format!("{:?}", ResponseBody::Unset), "Unset");
    }
}
