//! HTTP/1.1 over a raw connection object.
//!
//! The firmware has no HTTP client in use here; requests are written into the
//! send buffer as text and the reply is read back verbatim.

use crate::error::{ProtocolError, ProtocolResult};
use crate::escape::escape_text;

/// Separates the header block from the body.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Escaped CRLF as it appears inside a string literal.
const ESCAPED_CRLF: &[u8] = b"\\r\\n";

/// A request built from its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest<'a> {
    /// Request method, e.g. `GET`.
    pub method: &'a str,
    /// Server host name or address; also used for the `HOST` header.
    pub host: &'a str,
    /// Server port.
    pub port: u16,
    /// Resource path.
    pub path: &'a str,
    /// Extra headers, each terminated with CRLF.
    pub headers: &'a str,
    /// Request body. Must not start with CRLF.
    pub body: &'a str,
}

impl<'a> HttpRequest<'a> {
    /// Create a request with no extra headers and no body.
    pub fn new(method: &'a str, host: &'a str, port: u16, path: &'a str) -> Self {
        HttpRequest {
            method,
            host,
            port,
            path,
            headers: "",
            body: "",
        }
    }

    /// Set the extra headers.
    pub fn with_headers(mut self, headers: &'a str) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: &'a str) -> Self {
        self.body = body;
        self
    }

    /// `Content-Length` is sent for every method except GET.
    pub fn sends_content_length(&self) -> bool {
        !self.method.eq_ignore_ascii_case("GET")
    }

    /// The request as it goes over the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in self.parts() {
            match part {
                Part::Text(text) => out.extend_from_slice(text.as_bytes()),
                Part::Crlf => out.extend_from_slice(b"\r\n"),
            }
        }
        out
    }

    /// The request as string-literal content, ready to be chunked with
    /// [`Chunker::escaped`](crate::Chunker::escaped).
    pub fn to_escaped(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in self.parts() {
            match part {
                Part::Text(text) => out.extend_from_slice(&escape_text(text.as_bytes())),
                Part::Crlf => out.extend_from_slice(ESCAPED_CRLF),
            }
        }
        out
    }

    fn parts(&self) -> Vec<Part> {
        let mut parts = vec![
            Part::Text(self.method.to_string()),
            Part::Text(" ".to_string()),
            Part::Text(self.path.to_string()),
            Part::Text(" HTTP/1.1".to_string()),
            Part::Crlf,
            Part::Text(format!("HOST: {}:{}", self.host, self.port)),
            Part::Crlf,
        ];

        if self.sends_content_length() {
            parts.push(Part::Text(format!("Content-Length: {}", self.body.len())));
            parts.push(Part::Crlf);
        }

        parts.push(Part::Text(self.headers.to_string()));
        parts.push(Part::Crlf);
        parts.push(Part::Text(self.body.to_string()));
        parts
    }
}

/// A request fragment: text to escape, or a line break.
enum Part {
    Text(String),
    Crlf,
}

/// Status code and body position of a buffered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResult {
    /// Numeric status code, never zero.
    pub status: u16,
    /// Offset of the first body byte.
    pub body_offset: usize,
}

impl HttpResult {
    /// Parse a response whose first line is `HTTP/<version> <code> <reason>`.
    pub fn parse(response: &[u8]) -> ProtocolResult<HttpResult> {
        Ok(HttpResult {
            status: parse_status_code(response)?,
            body_offset: body_offset(response)?,
        })
    }

    /// The body of `response`.
    pub fn body<'r>(&self, response: &'r [u8]) -> &'r [u8] {
        response.get(self.body_offset..).unwrap_or(&[])
    }
}

/// Read the status code following the first space.
///
/// Leading spaces before the digits are skipped. A missing or zero code is an
/// error.
pub fn parse_status_code(response: &[u8]) -> ProtocolResult<u16> {
    let space = response
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ProtocolError::MissingHttpCode)?;

    let digits: Vec<u8> = response[space..]
        .iter()
        .copied()
        .skip_while(|&b| b == b' ')
        .take_while(|b| b.is_ascii_digit())
        .collect();

    let code = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    if code == 0 {
        return Err(ProtocolError::MissingHttpCode);
    }
    Ok(code)
}

/// Offset of the body: the first byte after the first blank line.
pub fn body_offset(response: &[u8]) -> ProtocolResult<usize> {
    response
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
        .ok_or(ProtocolError::MissingBody)
}
