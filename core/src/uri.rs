/*
 * uri.rs
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

//! Request targets: `http`/`https` URLs (authority + path) and the host/port/scheme triple
//! a connector dials.

use std::fmt;

use crate::error::HttpError;
use crate::http::RequestDescriptor;

/// URL scheme. `Https` connects with TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }

    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("https") {
            Some(Scheme::Https)
        } else if s.eq_ignore_ascii_case("http") {
            Some(Scheme::Http)
        } else {
            None
        }
    }
}

/// Components of an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
    /// Path with query, always starting with `/`.
    pub path: String,
}

/// Parse `scheme://host[:port][/path][?query]`. Userinfo and fragments are not accepted.
pub fn parse_url(url: &str) -> Result<ParsedUrl, HttpError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| HttpError::InvalidTarget(format!("not an absolute URL: {}", url)))?;
    let scheme = Scheme::parse(scheme)
        .ok_or_else(|| HttpError::InvalidTarget(format!("unsupported scheme: {}", scheme)))?;
    let rest = rest.split('#').next().unwrap_or(rest);
    let path_start = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, path) = rest.split_at(path_start);
    if authority.contains('@') {
        return Err(HttpError::InvalidTarget("userinfo not supported".to_string()));
    }
    let (host, port) = split_authority(authority)?;
    if host.is_empty() {
        return Err(HttpError::InvalidTarget(format!("missing host: {}", url)));
    }
    let path = if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('?') {
        format!("/{}", path)
    } else {
        path.to_string()
    };
    Ok(ParsedUrl {
        scheme,
        host: host.to_string(),
        port,
        path,
    })
}

/// Split `host[:port]`, keeping bracketed IPv6 literals intact.
fn split_authority(authority: &str) -> Result<(&str, Option<u16>), HttpError> {
    let (host, port) = if let Some(stripped) = authority.strip_prefix('[') {
        let end = stripped
            .find(']')
            .ok_or_else(|| HttpError::InvalidTarget(format!("bad IPv6 literal: {}", authority)))?;
        let after = &stripped[end + 1..];
        (&stripped[..end], after.strip_prefix(':'))
    } else {
        match authority.rsplit_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (authority, None),
        }
    };
    let port = match port {
        Some(p) => Some(
            p.parse::<u16>()
                .map_err(|_| HttpError::InvalidTarget(format!("bad port: {}", p)))?,
        ),
        None => None,
    };
    Ok((host, port))
}

/// Where an exchange connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Resolve host, port and scheme of a request. A missing host is an error.
    pub fn from_request(request: &RequestDescriptor) -> Result<Self, HttpError> {
        let host = request
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HttpError::InvalidTarget("request has no host".to_string()))?;
        Ok(Self {
            scheme: request.scheme,
            host: host.to_string(),
            port: request.port.unwrap_or_else(|| request.scheme.default_port()),
        })
    }

    /// `host:port` for socket connect. IPv6 literals are bracketed.
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.socket_addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn parse_full_url() {
        let u = parse_url("https://api.example.net:8443/v1/relays?all=1#frag").unwrap();
        assert_eq!(u.scheme, Scheme::Https);
        assert_eq!(u.host, "api.example.net");
        assert_eq!(u.port, Some(8443));
        assert_eq!(u.path, "/v1/relays?all=1");
    }

    #[test]
    fn parse_bare_host() {
        let u = parse_url("http://example.com").unwrap();
        assert_eq!(u.scheme, Scheme::Http);
        assert_eq!(u.port, None);
        assert_eq!(u.path, "/");
        assert_eq!(parse_url("http://example.com?q").unwrap().path, "/?q");
    }

    #[test]
    fn parse_ipv6() {
        let u = parse_url("https://[::1]:9000/x").unwrap();
        assert_eq!(u.host, "::1");
        assert_eq!(u.port, Some(9000));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(parse_url("ftp://x/"), Err(HttpError::InvalidTarget(_))));
        assert!(matches!(parse_url("example.com/x"), Err(HttpError::InvalidTarget(_))));
        assert!(matches!(parse_url("https:///x"), Err(HttpError::InvalidTarget(_))));
        assert!(matches!(parse_url("https://h:99999/"), Err(HttpError::InvalidTarget(_))));
        assert!(matches!(parse_url("https://u@h/"), Err(HttpError::InvalidTarget(_))));
    }

    #[test]
    fn target_from_request() {
        let r = RequestDescriptor::from_url(Method::Get, "https://[::1]/").unwrap();
        let t = Target::from_request(&r).unwrap();
        assert_eq!(t.port, 443);
        assert_eq!(t.socket_addr(), "[::1]:443");
        assert_eq!(t.to_string(), "https://[::1]:443");

        let r = RequestDescriptor::new(Method::Get, "/");
        assert!(matches!(Target::from_request(&r), Err(HttpError::InvalidTarget(_))));
    }
}
