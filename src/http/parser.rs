use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::request::{split_uri, Request};
use crate::http::response::StatusCode;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Longest protocol line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Largest request body accepted.
pub const MAX_BODY_LEN: usize = 8 * 1024 * 1024;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug)]
pub enum ParseError {
    /// The peer closed the connection (or sent a blank line) before a request line.
    EmptyRequest,
    InvalidRequestLine(String),
    InvalidHeader(String),
    InvalidContentLength(String),
    LineTooLong,
    BodyTooLarge(usize),
    Io(std::io::Error),
}

impl ParseError {
    pub fn is_empty_request(&self) -> bool {
        matches!(self, ParseError::EmptyRequest)
    }

    /// Status to answer with, or `None` when no response should be written.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ParseError::EmptyRequest | ParseError::Io(_) => None,
            ParseError::BodyTooLarge(_) => Some(StatusCode::PayloadTooLarge),
            _ => Some(StatusCode::BadRequest),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyRequest => write!(f, "empty request"),
            ParseError::InvalidRequestLine(line) => write!(f, "invalid request line: {line:?}"),
            ParseError::InvalidHeader(line) => write!(f, "invalid header line: {line:?}"),
            ParseError::InvalidContentLength(v) => write!(f, "invalid Content-Length: {v:?}"),
            ParseError::LineTooLong => write!(f, "line exceeds {MAX_LINE_LEN} bytes"),
            ParseError::BodyTooLarge(len) => write!(f, "body of {len} bytes exceeds {MAX_BODY_LEN}"),
            ParseError::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Reads one CRLF-terminated line.
///
/// Bytes are taken one at a time and mapped one-to-one onto characters
/// (ISO-8859-1). A bare LF does not end the line. Trailing whitespace,
/// including the CR, is trimmed. End of stream ends the line; with nothing
/// read that yields an empty string.
pub async fn read_line<R>(reader: &mut R) -> Result<String, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    let mut byte = [0u8; 1];
    let mut pre = 0u8;
    let mut read = 0usize;

    loop {
        if reader.read(&mut byte).await? == 0 {
            break;
        }
        let cur = byte[0];
        if pre == CR && cur == LF {
            break;
        }

        read += 1;
        if read > MAX_LINE_LEN {
            return Err(ParseError::LineTooLong);
        }

        line.push(cur as char);
        pre = cur;
    }

    line.truncate(line.trim_end().len());
    Ok(line)
}

/// Parses exactly one request off `reader`.
///
/// Reads the request line, the header block up to its blank terminator and,
/// when `Content-Length` is present, that many body bytes. Nothing beyond the
/// body is consumed.
pub async fn parse_request<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    // Request line
    let request_line = read_line(reader).await?;
    if request_line.is_empty() {
        return Err(ParseError::EmptyRequest);
    }
    tracing::trace!(line = %request_line, "request line");

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let &[method, uri, protocol] = parts.as_slice() else {
        return Err(ParseError::InvalidRequestLine(request_line.clone()));
    };

    let (request_path, query_string) = split_uri(uri);
    if request_path.is_empty() {
        return Err(ParseError::InvalidRequestLine(request_line.clone()));
    }

    let mut parameters = HashMap::new();
    if let Some(query) = query_string {
        parse_parameters(query, &mut parameters);
    }

    // Headers
    let headers = parse_headers(reader).await?;

    // Body
    let mut body = Bytes::new();
    if let Some(value) = headers.get("Content-Length") {
        let len = value
            .trim()
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength(value.clone()))?;
        if len > MAX_BODY_LEN {
            return Err(ParseError::BodyTooLarge(len));
        }

        let mut data = vec![0u8; len];
        reader.read_exact(&mut data).await?;

        if headers.get("Content-Type").map(String::as_str) == Some(FORM_URLENCODED) {
            let line: String = data.iter().map(|&b| b as char).collect();
            parse_parameters(&line, &mut parameters);
        }
        body = Bytes::from(data);
    }

    let request = Request {
        method: method.to_string(),
        uri: uri.to_string(),
        protocol: protocol.to_string(),
        request_path: request_path.to_string(),
        query_string: query_string.map(str::to_string),
        parameters,
        headers,
        body,
    };

    tracing::debug!(
        method = %request.method,
        path = %request.request_path,
        parameters = request.parameters.len(),
        headers = request.headers.len(),
        "Parsed request"
    );

    Ok(request)
}

async fn parse_headers<R>(reader: &mut R) -> Result<HashMap<String, String>, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut headers = HashMap::new();

    loop {
        let line = read_line(reader).await?;
        if line.is_empty() {
            break;
        }

        let (name, value) = line
            .split_once(": ")
            .ok_or_else(|| ParseError::InvalidHeader(line.clone()))?;

        headers.insert(name.to_string(), value.to_string());
    }

    Ok(headers)
}

/// Decodes `%XX` escapes as UTF-8 and `+` as a space.
///
/// Malformed escapes are kept verbatim; invalid UTF-8 becomes U+FFFD.
pub fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Decodes `line` and merges its `name=value&...` pairs into `parameters`.
///
/// The whole line is decoded before it is split. Each pair splits on its
/// first `=`; a pair without one maps to `None`. Empty pairs are skipped and
/// later pairs overwrite earlier ones.
pub fn parse_parameters(line: &str, parameters: &mut HashMap<String, Option<String>>) {
    let decoded = url_decode(line);

    for pair in decoded.split('&').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((name, value)) => {
                parameters.insert(name.to_string(), Some(value.to_string()));
            }
            None => {
                parameters.insert(pair.to_string(), None);
            }
        }
    }
}
