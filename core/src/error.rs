/*
 * error.rs
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

//! Exchange errors. Every failure is delivered once, as the payload of the terminal
//! `finished` event.

use std::io;

use crate::http::h1::DecodeError;

/// Terminal error of an exchange.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Status line did not have the shape `HTTP/<version> <code> <reason>`.
    #[error("cannot parse response: malformed status line {0:?}")]
    MalformedStatusLine(String),

    /// Header line without a colon, or an unusable `content-length`.
    #[error("cannot parse response: malformed header line {0:?}")]
    MalformedHeaderLine(String),

    /// Response head was not valid UTF-8.
    #[error("cannot parse response: {0}")]
    InvalidEncoding(#[from] DecodeError),

    /// Connection failed, was refused by the trust hook, or closed early.
    #[error("transport failure{}", .0.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    Transport(Option<io::Error>),

    /// The exchange was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// Request body was a stream; only in-memory bodies can be serialized.
    #[error("streamed request bodies are not supported")]
    UnsupportedBody,

    /// Request had no usable host or scheme.
    #[error("invalid request target: {0}")]
    InvalidTarget(String),
}

impl HttpError {
    pub fn transport(err: io::Error) -> Self {
        HttpError::Transport(Some(err))
    }

    /// True for the "cannot parse response" kinds.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            HttpError::MalformedStatusLine(_)
                | HttpError::MalformedHeaderLine(_)
                | HttpError::InvalidEncoding(_)
        )
    }

    /// Underlying transport error, if any.
    pub fn transport_cause(&self) -> Option<&io::Error> {
        match self {
            HttpError::Transport(cause) => cause.as_ref(),
            _ => None,
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(err: io::Error) -> Self {
        HttpError::transport(err)
    }
}
