/*
 * serializer.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pinwire, an HTTP/1.1 client for caller-trusted TLS.
 *
 * Pinwire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pinwire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pinwire.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP/1.1 request serialization.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::HttpError;
use crate::http::request::{RequestBody, RequestDescriptor};

const CRLF: &[u8] = b"\r\n";

/// Serialize a request head and in-memory body to wire bytes.
///
/// Request line, `Host` (when known), `Content-Length` (when a body is present), then the
/// caller's headers in insertion order, a blank line, and the body verbatim. Header names
/// are neither canonicalized nor deduplicated.
pub fn serialize_request(request: &RequestDescriptor) -> Result<Bytes, HttpError> {
    let body = match &request.body {
        None => None,
        Some(RequestBody::Buffered(b)) => Some(b),
        Some(RequestBody::Stream(_)) => return Err(HttpError::UnsupportedBody),
    };

    let mut lines: Vec<String> = Vec::with_capacity(request.headers.len() + 3);
    lines.push(format!("{} {} HTTP/1.1", request.method(), request.path()));
    if let Some(host) = request.host_header() {
        lines.push(format!("Host: {}", host));
    }
    if let Some(body) = body {
        lines.push(format!("Content-Length: {}", body.len()));
    }
    for (name, value) in &request.headers {
        lines.push(format!("{}: {}", name, value));
    }

    let head_len: usize = lines.iter().map(|l| l.len() + CRLF.len()).sum();
    let mut out = BytesMut::with_capacity(head_len + CRLF.len() + body.map_or(0, |b| b.len()));
    for line in &lines {
        out.put_slice(line.as_bytes());
        out.put_slice(CRLF);
    }
    out.put_slice(CRLF);
    if let Some(body) = body {
        out.put_slice(body);
    }
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn minimal_get() {
        let mut r = RequestDescriptor::new(Method::Get, "/");
        r.host("example.com");
        let wire = serialize_request(&r).unwrap();
        assert_eq!(&wire[..], b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
    }

    #[test]
    fn defaults_without_host() {
        let r = RequestDescriptor::default();
        let wire = serialize_request(&r).unwrap();
        assert_eq!(&wire[..], b"GET / HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn body_gets_content_length_and_follows_blank_line() {
        let mut r = RequestDescriptor::new(Method::Post, "/v1/submit");
        r.host("api.example.net")
            .header("Content-Type", "application/json")
            .body(&b"{\"a\":1}"[..]);
        let wire = serialize_request(&r).unwrap();
        assert_eq!(
            &wire[..],
            &b"POST /v1/submit HTTP/1.1\r\nHost: api.example.net\r\nContent-Length: 7\r\nContent-Type: application/json\r\n\r\n{\"a\":1}"[..]
        );
    }

    #[test]
    fn headers_in_insertion_order_with_duplicates() {
        let mut r = RequestDescriptor::new(Method::Get, "/x");
        r.header("b", "2").header("A", "1").header("b", "3");
        let wire = serialize_request(&r).unwrap();
        assert_eq!(&wire[..], b"GET /x HTTP/1.1\r\nb: 2\r\nA: 1\r\nb: 3\r\n\r\n");
    }

    #[test]
    fn empty_body_still_declares_length() {
        let mut r = RequestDescriptor::new(Method::Put, "/");
        r.body(Bytes::new());
        let wire = serialize_request(&r).unwrap();
        assert_eq!(&wire[..], b"PUT / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn streamed_body_rejected() {
        let mut r = RequestDescriptor::new(Method::Post, "/");
        r.body_stream(tokio::io::empty());
        assert!(matches!(serialize_request(&r), Err(HttpError::UnsupportedBody)));
    }
}
