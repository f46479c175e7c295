use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::buf::Writer;
use bytes::{BufMut, BytesMut};

/// HTTP status codes the server itself produces.
///
/// Handlers are free to set any code/reason pair through
/// [`Response::set_status_code`] and [`Response::set_status_reason`]; this
/// enum only names the ones the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 302 Moved Temporarily
    MovedTemporarily,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 413 Payload Too Large
    PayloadTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use minihttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::MovedTemporarily.as_u16(), 302);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::MovedTemporarily => 302,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    /// Returns the reason phrase sent on the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use minihttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedTemporarily => "Moved Temporarily",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Where the response body comes from.
#[derive(Debug)]
pub enum Body<'a> {
    Buffer(&'a [u8]),
    File(&'a Path),
    Empty,
}

/// An HTTP response under construction.
///
/// Created per connection, mutated by the dispatcher and handlers, then
/// serialized once by [`ResponseWriter`](crate::http::writer::ResponseWriter).
/// The body is either an in-memory buffer or a file; once the buffer has been
/// requested it takes precedence over any file, even when it stays empty.
#[derive(Debug)]
pub struct Response {
    status_code: u16,
    status_reason: String,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    content_file: Option<PathBuf>,
    buffer: Option<BytesMut>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// A `200 OK` response with no headers and no body.
    pub fn new() -> Self {
        Self {
            status_code: StatusCode::Ok.as_u16(),
            status_reason: StatusCode::Ok.reason_phrase().to_string(),
            headers: HashMap::new(),
            content_file: None,
            buffer: None,
        }
    }

    /// A plain-text response carrying the status line as its body.
    pub fn error(status: StatusCode) -> Self {
        let mut response = Self::new();
        response.set_status(status);
        response.set_content_type("text/plain");
        let text = format!("{} {}", status.as_u16(), status.reason_phrase());
        response.body_mut().put_slice(text.as_bytes());
        response
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_reason(&self) -> &str {
        &self.status_reason
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status_code = status.as_u16();
        self.status_reason = status.reason_phrase().to_string();
    }

    pub fn set_status_code(&mut self, code: u16) {
        self.status_code = code;
    }

    pub fn set_status_reason(&mut self, reason: impl Into<String>) {
        self.status_reason = reason.into();
    }

    /// Adds or replaces a header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn set_content_type(&mut self, mime: impl Into<String>) {
        self.add_header("Content-Type", mime);
    }

    /// Uses `path` as the body and describes it in the headers.
    ///
    /// `Content-Type` is only set when `content_type` is known; an unknown
    /// extension leaves any existing value alone.
    pub fn set_content_file(&mut self, path: impl Into<PathBuf>, len: u64, content_type: Option<&str>) {
        if let Some(mime) = content_type {
            self.set_content_type(mime);
        }
        self.add_header("Content-Length", len.to_string());
        self.content_file = Some(path.into());
    }

    pub fn content_file(&self) -> Option<&Path> {
        self.content_file.as_deref()
    }

    /// The in-memory body, created empty on first use.
    pub fn body_mut(&mut self) -> &mut BytesMut {
        self.buffer.get_or_insert_with(BytesMut::new)
    }

    /// An [`std::io::Write`] sink appending to the in-memory body.
    ///
    /// ```
    /// # use minihttp::http::response::Response;
    /// use std::io::Write;
    ///
    /// let mut response = Response::new();
    /// write!(response.writer(), "<h1>{}</h1>", 42).unwrap();
    /// assert_eq!(response.buffered_len(), Some(11));
    /// ```
    pub fn writer(&mut self) -> Writer<&mut BytesMut> {
        self.body_mut().writer()
    }

    /// Length of the in-memory body, if it was ever requested.
    pub fn buffered_len(&self) -> Option<usize> {
        self.buffer.as_ref().map(BytesMut::len)
    }

    /// Resolves the body source, buffer first.
    pub fn body(&self) -> Body<'_> {
        match (&self.buffer, &self.content_file) {
            (Some(buf), _) => Body::Buffer(buf),
            (None, Some(path)) => Body::File(path),
            (None, None) => Body::Empty,
        }
    }

    /// Asks the client to load `location` instead.
    pub fn send_redirect(&mut self, location: impl Into<String>) {
        self.set_status(StatusCode::MovedTemporarily);
        self.add_header("Location", location);
    }

    /// Sets `Content-Length` from the buffer when one exists.
    ///
    /// Called once right before serialization; overrides any length derived
    /// from a content file.
    pub fn prepare(&mut self) {
        if let Some(len) = self.buffered_len() {
            self.add_header("Content-Length", len.to_string());
        }
    }
}
