/*
 * mod.rs
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

//! HTTP client: HTTP/1.1 over a connection whose TLS trust is decided by the caller.
//!
//! - Callback-based response API: `ResponseHandler` with `response_received`,
//!   `data_received`, `finished`.
//! - Buffers: `bytes` crate (BytesMut for the scanner backlog and relay, Bytes for
//!   serialized requests).
//! - HTTP/1.1 only: line-scanned response head, Content-Length delimited body.
//! - One exchange per connection; no pooling, redirects, cookies or compression.

mod handler;
mod request;
mod response;

pub mod h1;

pub use handler::ResponseHandler;
pub use h1::{serialize_request, H1ResponseHandler, LineScanner, ResponseParser, Separator};
pub use request::{Method, RequestBody, RequestDescriptor};
pub use response::Response;

pub mod client;
pub mod connection;

pub use client::{Connector, NetworkConnector};
pub use connection::{cancellation, CancelHandle, CancelSignal, HttpStream, TransportAdapter};
