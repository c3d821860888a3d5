/*
 * connection.rs
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

//! Transport adapter: owns one connection per exchange, writes the serialized request,
//! pumps inbound bytes through the H1 parser and forwards its events to a
//! `ResponseHandler`.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tracing::{debug, trace, warn};

use crate::config::AdapterConfig;
use crate::error::HttpError;
use crate::http::client::{Connector, NetworkConnector};
use crate::http::h1::{serialize_request, H1ResponseHandler, ResponseParser};
use crate::http::request::RequestDescriptor;
use crate::http::response::Response;
use crate::http::ResponseHandler;
use crate::net::TrustEvaluator;
use crate::uri::Target;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Create a linked cancel handle and signal.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Requests cancellation of an exchange. Cloneable; `cancel` is idempotent.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Awaited by the adapter alongside the exchange.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    /// Resolves once cancelled. Pends forever if every handle was dropped uncancelled.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Bridges H1 parser callbacks to the user's ResponseHandler. Anything after the first
/// `finished` is dropped.
struct H1Driver<'a, H: ResponseHandler> {
    handler: &'a mut H,
    finished: bool,
}

impl<H: ResponseHandler> H1ResponseHandler for H1Driver<'_, H> {
    fn response_ready(&mut self, response: Response) {
        if !self.finished {
            self.handler.response_received(response.code, &response.headers);
        }
    }

    fn body_chunk(&mut self, data: &[u8]) {
        if !self.finished {
            self.handler.data_received(data);
        }
    }

    fn finished(&mut self, error: Option<HttpError>) {
        if self.finished {
            return;
        }
        self.finished = true;
        match &error {
            None => debug!("exchange complete"),
            Some(e) => debug!(error = %e, "exchange failed"),
        }
        self.handler.finished(error);
    }
}

/// Runs request/response exchanges, one at a time, each over a fresh connection.
pub struct TransportAdapter<C: Connector> {
    connector: C,
    trust: Arc<dyn TrustEvaluator>,
    config: AdapterConfig,
    parser: ResponseParser,
}

impl TransportAdapter<NetworkConnector> {
    /// Adapter dialing TCP/TLS directly.
    pub fn network(trust: Arc<dyn TrustEvaluator>, config: AdapterConfig) -> Self {
        let connector = NetworkConnector::new(&config);
        Self::new(connector, trust, config)
    }
}

impl<C: Connector> TransportAdapter<C> {
    pub fn new(connector: C, trust: Arc<dyn TrustEvaluator>, config: AdapterConfig) -> Self {
        Self {
            connector,
            trust,
            config,
            parser: ResponseParser::new(),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Execute one exchange. `handler.finished` is called exactly once before this returns,
    /// whether the exchange succeeds, fails or is cancelled through `cancel`.
    pub async fn execute<H: ResponseHandler>(
        &mut self,
        request: &RequestDescriptor,
        handler: &mut H,
        mut cancel: CancelSignal,
    ) {
        // A previous execute may have been dropped mid-exchange.
        self.parser.reset();
        let mut driver = H1Driver {
            handler,
            finished: false,
        };
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("exchange cancelled");
                Err(HttpError::Cancelled)
            }
            res = self.run(request, &mut driver) => res,
        };
        if let Err(e) = outcome {
            self.parser.finish(Some(e), &mut driver);
        }
    }

    async fn run<H: ResponseHandler>(
        &mut self,
        request: &RequestDescriptor,
        driver: &mut H1Driver<'_, H>,
    ) -> Result<(), HttpError> {
        let target = Target::from_request(request)?;
        debug!(%target, method = %request.method(), path = request.path(), "starting exchange");

        let connect = self.connector.connect(&target, self.trust.clone());
        let mut stream = match timeout(self.config.connect_timeout(), connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!(%target, error = %e, "connect failed");
                return Err(HttpError::transport(e));
            }
            Err(_) => {
                warn!(%target, "connect timed out");
                return Err(HttpError::transport(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connect timed out",
                )));
            }
        };

        let wire = serialize_request(request)?;
        stream.write_all(&wire).await?;
        stream.flush().await?;
        trace!(bytes = wire.len(), "request written");

        let read_size = self.config.read_buffer_size();
        let mut relay = BytesMut::with_capacity(read_size);
        while !driver.finished {
            relay.clear();
            relay.reserve(read_size);
            let n = stream.read_buf(&mut relay).await?;
            if n == 0 {
                return Err(HttpError::transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before response completed",
                )));
            }
            trace!(bytes = n, "received");
            self.parser.receive(&relay, driver);
        }
        Ok(())
    }
}
