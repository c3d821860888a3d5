/*
 * client.rs
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

//! Connection establishment: the `Connector` seam and the TCP/TLS implementation.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::config::AdapterConfig;
use crate::http::connection::HttpStream;
use crate::net::{client_config, TrustEvaluator};
use crate::uri::Target;

/// Opens the transport for one exchange.
///
/// The returned future resolving `Ok` is the connection's ready signal; `Err` is its
/// failure. Dropping the stream tears the connection down.
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connect to `target`. TLS connections must consult `trust` for the peer chain.
    fn connect(
        &self,
        target: &Target,
        trust: Arc<dyn TrustEvaluator>,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// TCP connector; `https` targets get a TLS handshake whose trust decision is made by
/// the supplied evaluator.
#[derive(Debug, Clone, Default)]
pub struct NetworkConnector {
    alpn_http11: bool,
}

impl NetworkConnector {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            alpn_http11: config.alpn_http11,
        }
    }
}

impl Connector for NetworkConnector {
    type Stream = HttpStream;

    fn connect(
        &self,
        target: &Target,
        trust: Arc<dyn TrustEvaluator>,
    ) -> impl Future<Output = io::Result<HttpStream>> + Send {
        let target = target.clone();
        let alpn_http11 = self.alpn_http11;
        async move {
            let tcp = TcpStream::connect(target.socket_addr()).await?;
            tcp.set_nodelay(true)?;
            if !target.scheme.is_secure() {
                debug!(%target, "connected (plain)");
                return Ok(HttpStream::Plain(tcp));
            }
            let server_name = ServerName::try_from(target.host.clone())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?;
            let connector = TlsConnector::from(client_config(trust, alpn_http11)?);
            let tls = connector.connect(server_name, tcp).await?;
            debug!(%target, "connected (tls)");
            Ok(HttpStream::Tls(Box::new(tls)))
        }
    }
}
