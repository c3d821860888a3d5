/*
 * lib.rs
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

//! Pinwire core: a minimal HTTP/1.1 client running over a transport whose TLS trust
//! decisions belong to the caller.
//!
//! - `http::h1`: line scanner, request serializer, response parser.
//! - `http::connection`: `TransportAdapter`, which drives one exchange per connection
//!   and reports through `ResponseHandler`.
//! - `net`: the trust evaluation hook and its rustls verifier.

pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod uri;

pub use config::AdapterConfig;
pub use error::HttpError;
pub use net::{PlatformTrust, TrustDecision, TrustEvaluator};
