//! HTTP requests over a TCP connection.
//!
//! The request is written into the remote send buffer as text; the first
//! reply packet is read back and its status line parsed. The connection is
//! closed and the module switched off afterwards, whatever happened.

use tracing::{debug, trace};
use wifibee_protocol::{parse_status_code, HttpRequest, HttpResult, RECEIVED_PROMPT};

use crate::clock::Clock;
use crate::error::{DriverError, DriverResult};
use crate::session::Session;
use crate::transport::ByteTransport;

impl<T: ByteTransport, C: Clock> Session<T, C> {
    /// Send `request` and read the reply.
    ///
    /// Returns the status code, or `None` if the request was sent but the
    /// server never answered.
    pub fn http_action(&mut self, request: &HttpRequest<'_>) -> DriverResult<Option<u16>> {
        if let Err(err) = self.open_tcp(request.host, request.port) {
            self.off();
            return Err(err);
        }

        let result = self.http_exchange(request);

        // The server may already have closed the connection.
        if let Err(err) = self.close() {
            debug!("Http: close after request: {}", err);
        }

        result
    }

    fn http_exchange(&mut self, request: &HttpRequest<'_>) -> DriverResult<Option<u16>> {
        debug!(
            "Http: {} {}:{}{}",
            request.method, request.host, request.port, request.path
        );
        let chunks = self.chunker.escaped(&request.to_escaped());
        self.upload(chunks)?;

        if !self.await_reply()? {
            return Ok(None);
        }

        // Only the first packet is kept remotely; let the rest arrive.
        let mut extra = 0;
        loop {
            match self
                .channel
                .skip_till_prompt(RECEIVED_PROMPT, self.timeouts.next_packet)
            {
                Ok(()) => extra += 1,
                Err(err) if err.is_timeout() => break,
                Err(err) => return Err(err),
            }
        }
        if extra > 0 {
            trace!("Http: skipped {} further packets", extra);
        }

        self.read_server_response()?;
        let status = parse_status_code(self.buffer.as_slice())?;
        debug!("Http: status {}", status);
        Ok(Some(status))
    }

    /// `GET` `path` from `server`.
    pub fn http_get(
        &mut self,
        server: &str,
        port: u16,
        path: &str,
        headers: &str,
    ) -> DriverResult<Option<u16>> {
        let request = HttpRequest::new("GET", server, port, path).with_headers(headers);
        self.http_action(&request)
    }

    /// `POST` `body` to `path` on `server`.
    pub fn http_post(
        &mut self,
        server: &str,
        port: u16,
        path: &str,
        headers: &str,
        body: &str,
    ) -> DriverResult<Option<u16>> {
        let request = HttpRequest::new("POST", server, port, path)
            .with_headers(headers)
            .with_body(body);
        self.http_action(&request)
    }

    /// `PUT` `body` to `path` on `server`.
    pub fn http_put(
        &mut self,
        server: &str,
        port: u16,
        path: &str,
        headers: &str,
        body: &str,
    ) -> DriverResult<Option<u16>> {
        let request = HttpRequest::new("PUT", server, port, path)
            .with_headers(headers)
            .with_body(body);
        self.http_action(&request)
    }

    /// Copy the body of the buffered reply into `out`.
    ///
    /// Returns the number of bytes copied and the status code. A reply
    /// without a status code or without a blank line after the headers is
    /// an error.
    pub fn read_http_response(&self, out: &mut [u8]) -> DriverResult<(usize, u16)> {
        if self.buffer.is_empty() {
            return Err(DriverError::NoResponse);
        }

        let response = self.buffer.as_slice();
        let parsed = HttpResult::parse(response)?;
        let body = parsed.body(response);

        let count = out.len().min(body.len());
        out[..count].copy_from_slice(&body[..count]);
        Ok((count, parsed.status))
    }
}
