/*
 * config.rs
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

//! Adapter configuration. Every field has a default; a JSON document may override any
//! subset of them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_READ_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Time allowed for TCP connect plus TLS handshake.
    pub connect_timeout_ms: u64,
    /// Bytes requested from the connection per read.
    pub read_buffer_size: usize,
    /// Advertise `http/1.1` via ALPN on TLS connections.
    pub alpn_http11: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            alpn_http11: true,
        }
    }
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read size, never zero.
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size.max(1)
    }
}
