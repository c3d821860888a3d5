/*
 * response.rs
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

//! Parsed response head.

use std::collections::HashMap;

/// Status and headers of a response. Header names are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Version part of the protocol token, e.g. `1.1`.
    pub version: String,
    pub code: u16,
    pub headers: HashMap<String, String>,
}

impl Response {
    pub fn new(version: impl Into<String>, code: u16, headers: HashMap<String, String>) -> Self {
        Self {
            version: version.into(),
            code,
            headers,
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}
