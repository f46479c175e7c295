use std::collections::HashMap;

use bytes::Bytes;

/// Represents a parsed HTTP request from a client.
///
/// Contains everything extracted from the request line, the header block and,
/// for form submissions, the body. Parameters from the query string and from a
/// form-encoded body share one map; a key without `=` maps to `None`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method exactly as sent (e.g. "GET")
    pub method: String,
    /// The raw request target (e.g. "/myweb/login?username=alice")
    pub uri: String,
    /// Protocol version token (typically "HTTP/1.1")
    pub protocol: String,
    /// The part of `uri` before the first `?`
    pub request_path: String,
    /// The part of `uri` after the first `?`, if any
    pub query_string: Option<String>,
    /// Decoded query and form parameters
    pub parameters: HashMap<String, Option<String>>,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Raw request body, empty unless `Content-Length` was sent
    pub body: Bytes,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<String>,
    uri: Option<String>,
    protocol: Option<String>,
    headers: HashMap<String, String>,
    parameters: HashMap<String, Option<String>>,
    body: Bytes,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            uri: None,
            protocol: None,
            headers: HashMap::new(),
            parameters: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: Option<&str>) -> Self {
        self.parameters.insert(key.into(), value.map(str::to_string));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Splits the URI the same way the parser does. Parameters set on the
    /// builder are kept as given; the query string is not decoded.
    pub fn build(self) -> Result<Request, &'static str> {
        let uri = self.uri.ok_or("uri missing")?;
        let (request_path, query_string) = split_uri(&uri);
        if request_path.is_empty() {
            return Err("empty request path");
        }

        Ok(Request {
            method: self.method.unwrap_or_else(|| "GET".to_string()),
            request_path: request_path.to_string(),
            query_string: query_string.map(str::to_string),
            uri,
            protocol: self.protocol.unwrap_or_else(|| "HTTP/1.1".to_string()),
            parameters: self.parameters,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a request target on its first `?`.
pub fn split_uri(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(key)
            .map(|v| v.as_str())
    }

    /// Retrieves a parameter value.
    ///
    /// Returns `None` both when the parameter is missing and when it was sent
    /// without a value (`?flag`). Use [`Request::has_parameter`] to tell the
    /// two apart.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|v| v.as_deref())
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
}
