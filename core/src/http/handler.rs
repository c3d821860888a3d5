/*
 * handler.rs
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

//! Response handler trait: the notification interface an embedding URL-loading shim
//! implements.
//!
//! Events: response_received → data_received (×n) → finished.

use std::collections::HashMap;

use crate::error::HttpError;

/// Handler for exchange events (push model). The adapter drives this as data arrives.
///
/// Per exchange, in order:
/// 1. `response_received(code, headers)` at most once; header names are lower-cased
/// 2. `data_received(data)` for each body chunk
/// 3. `finished(error)` exactly once; `None` on success
///
/// A failure before the head is parsed produces only `finished(Some(error))`.
pub trait ResponseHandler {
    fn response_received(&mut self, status: u16, headers: &HashMap<String, String>);

    /// Data is only valid for the duration of the call.
    fn data_received(&mut self, data: &[u8]);

    fn finished(&mut self, error: Option<HttpError>);
}

impl<H: ResponseHandler + ?Sized> ResponseHandler for &mut H {
    fn response_received(&mut self, status: u16, headers: &HashMap<String, String>) {
        (**self).response_received(status, headers);
    }

    fn data_received(&mut self, data: &[u8]) {
        (**self).data_received(data);
    }

    fn finished(&mut self, error: Option<HttpError>) {
        (**self).finished(error);
    }
}

impl<H: ResponseHandler + ?Sized> ResponseHandler for Box<H> {
    fn response_received(&mut self, status: u16, headers: &HashMap<String, String>) {
        (**self).response_received(status, headers);
    }

    fn data_received(&mut self, data: &[u8]) {
        (**self).data_received(data);
    }

    fn finished(&mut self, error: Option<HttpError>) {
        (**self).finished(error);
    }
}
