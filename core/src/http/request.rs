/*
 * request.rs
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

//! HTTP request descriptor: method, path, target, headers, optional body.
//!
//! Read-only to the serializer and the adapter; the serializer produces a new owned buffer.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::HttpError;
use crate::uri::{parse_url, Scheme};

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }

    /// Parse a method token. Empty input means GET.
    pub fn parse(s: &str) -> Self {
        match s {
            "" | "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body. Only `Buffered` can be put on the wire.
pub enum RequestBody {
    Buffered(Bytes),
    Stream(Pin<Box<dyn AsyncRead + Send + Sync>>),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Buffered(b) => f.debug_tuple("Buffered").field(&b.len()).finish(),
            RequestBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Request to execute over one exchange.
///
/// Headers keep insertion order and are not deduplicated.
#[derive(Debug, Default)]
pub struct RequestDescriptor {
    pub method: Option<Method>,
    pub path: Option<String>,
    pub scheme: Scheme,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Build from an absolute `http` or `https` URL.
    pub fn from_url(method: Method, url: &str) -> Result<Self, HttpError> {
        let parsed = parse_url(url)?;
        Ok(Self {
            method: Some(method),
            path: Some(parsed.path),
            scheme: parsed.scheme,
            host: Some(parsed.host),
            port: parsed.port,
            ..Self::default()
        })
    }

    /// Method to send: GET when absent or empty.
    pub fn method(&self) -> Method {
        match &self.method {
            Some(Method::Other(s)) if s.is_empty() => Method::Get,
            Some(m) => m.clone(),
            None => Method::Get,
        }
    }

    /// Path to send: `/` when absent or empty.
    pub fn path(&self) -> &str {
        match self.path.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => "/",
        }
    }

    pub fn host(&mut self, host: impl Into<String>) -> &mut Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    pub fn scheme(&mut self, scheme: Scheme) -> &mut Self {
        self.scheme = scheme;
        self
    }

    /// Append a header. Existing headers with the same name are kept.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set an in-memory body. `Content-Length` is added when serialized.
    pub fn body(&mut self, data: impl Into<Bytes>) -> &mut Self {
        self.body = Some(RequestBody::Buffered(data.into()));
        self
    }

    /// Set a streamed body. Serializing such a request fails with `UnsupportedBody`.
    pub fn body_stream(&mut self, stream: impl AsyncRead + Send + Sync + 'static) -> &mut Self {
        self.body = Some(RequestBody::Stream(Box::pin(stream)));
        self
    }

    /// Value for the `Host` header: host, plus `:port` when not the scheme default.
    pub fn host_header(&self) -> Option<String> {
        let host = self.host.as_deref().filter(|h| !h.is_empty())?;
        let host = if host.contains(':') {
            format!("[{}]", host)
        } else {
            host.to_string()
        };
        match self.port {
            Some(port) if port != self.scheme.default_port() => Some(format!("{}:{}", host, port)),
            _ => Some(host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let r = RequestDescriptor::default();
        assert_eq!(r.method(), Method::Get);
        assert_eq!(r.path(), "/");
        assert_eq!(r.host_header(), None);
        let r = RequestDescriptor::new(Method::Other(String::new()), "");
        assert_eq!(r.method(), Method::Get);
        assert_eq!(r.path(), "/");
    }

    #[test]
    fn method_parse() {
        assert_eq!(Method::parse(""), Method::Get);
        assert_eq!(Method::parse("POST"), Method::Post);
        assert_eq!(Method::parse("PURGE"), Method::Other("PURGE".into()));
        assert_eq!(Method::parse("PURGE").as_str(), "PURGE");
    }

    #[test]
    fn host_header_port_rule() {
        let mut r = RequestDescriptor::default();
        r.host("api.example.net");
        assert_eq!(r.host_header().as_deref(), Some("api.example.net"));
        r.port(443);
        assert_eq!(r.host_header().as_deref(), Some("api.example.net"));
        r.port(8443);
        assert_eq!(r.host_header().as_deref(), Some("api.example.net:8443"));
        r.scheme(Scheme::Http).port(80);
        assert_eq!(r.host_header().as_deref(), Some("api.example.net"));
        r.host("::1").port(8080);
        assert_eq!(r.host_header().as_deref(), Some("[::1]:8080"));
    }

    #[test]
    fn from_url_fills_target() {
        let r = RequestDescriptor::from_url(Method::Post, "https://api.example.net:8443/v1/accounts?x=1")
            .unwrap();
        assert_eq!(r.method(), Method::Post);
        assert_eq!(r.path(), "/v1/accounts?x=1");
        assert_eq!(r.host.as_deref(), Some("api.example.net"));
        assert_eq!(r.port, Some(8443));
        assert_eq!(r.scheme, Scheme::Https);
    }

    #[test]
    fn headers_keep_order_and_duplicates() {
        let mut r = RequestDescriptor::default();
        r.header("Accept", "a").header("X-Dup", "1").header("X-Dup", "2");
        assert_eq!(r.headers.len(), 3);
        assert_eq!(r.headers[2], ("X-Dup".to_string(), "2".to_string()));
    }
}
