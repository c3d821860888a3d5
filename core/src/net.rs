/*
 * net.rs
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

//! TLS trust plumbing: the caller-supplied trust evaluator and the rustls verifier that
//! invokes it during the handshake.
//!
//! The library owns no trust policy. `PlatformTrust` (native roots, Mozilla roots as
//! fallback) is provided for callers that do not pin.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore,
    SignatureScheme,
};
use tracing::{debug, warn};

pub use tokio_rustls::rustls::pki_types::CertificateDer as Certificate;

/// Outcome of a trust evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    Accept,
    Reject,
}

impl From<bool> for TrustDecision {
    fn from(accept: bool) -> Self {
        if accept {
            TrustDecision::Accept
        } else {
            TrustDecision::Reject
        }
    }
}

/// Trust policy consulted during the TLS handshake.
///
/// `chain` is the DER certificate chain presented by the peer, leaf first.
pub trait TrustEvaluator: Send + Sync {
    fn evaluate(&self, host: &str, chain: &[CertificateDer<'_>]) -> TrustDecision;
}

impl<F> TrustEvaluator for F
where
    F: Fn(&str, &[CertificateDer<'_>]) -> bool + Send + Sync,
{
    fn evaluate(&self, host: &str, chain: &[CertificateDer<'_>]) -> TrustDecision {
        self(host, chain).into()
    }
}

/// Process-wide crypto provider, or the aws-lc-rs default when none is installed.
fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(tokio_rustls::rustls::crypto::aws_lc_rs::default_provider()))
}

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.to_vec();
    }
    root_store
}

/// WebPKI validation against the platform roots.
pub struct PlatformTrust {
    verifier: Arc<WebPkiServerVerifier>,
}

impl PlatformTrust {
    pub fn new() -> io::Result<Self> {
        let verifier = WebPkiServerVerifier::builder_with_provider(
            Arc::new(build_root_store()),
            crypto_provider(),
        )
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(Self { verifier })
    }
}

impl fmt::Debug for PlatformTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformTrust").finish_non_exhaustive()
    }
}

impl TrustEvaluator for PlatformTrust {
    fn evaluate(&self, host: &str, chain: &[CertificateDer<'_>]) -> TrustDecision {
        let (end_entity, intermediates) = match chain.split_first() {
            Some(split) => split,
            None => return TrustDecision::Reject,
        };
        let server_name = match ServerName::try_from(host.to_string()) {
            Ok(name) => name,
            Err(_) => return TrustDecision::Reject,
        };
        match self
            .verifier
            .verify_server_cert(end_entity, intermediates, &server_name, &[], UnixTime::now())
        {
            Ok(_) => TrustDecision::Accept,
            Err(e) => {
                debug!(host, error = %e, "platform trust rejected certificate");
                TrustDecision::Reject
            }
        }
    }
}

/// rustls verifier delegating the certificate decision to a `TrustEvaluator`.
/// Handshake signatures are still checked with the crypto provider.
pub struct TrustHookVerifier {
    trust: Arc<dyn TrustEvaluator>,
    provider: Arc<CryptoProvider>,
}

impl TrustHookVerifier {
    pub fn new(trust: Arc<dyn TrustEvaluator>) -> Self {
        Self {
            trust,
            provider: crypto_provider(),
        }
    }
}

impl fmt::Debug for TrustHookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustHookVerifier").finish_non_exhaustive()
    }
}

fn server_name_str(server_name: &ServerName<'_>) -> String {
    match server_name {
        ServerName::DnsName(name) => name.as_ref().to_string(),
        ServerName::IpAddress(ip) => std::net::IpAddr::from(*ip).to_string(),
        _ => String::new(),
    }
}

impl ServerCertVerifier for TrustHookVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        let host = server_name_str(server_name);
        let mut chain = Vec::with_capacity(intermediates.len() + 1);
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());
        match self.trust.evaluate(&host, &chain) {
            TrustDecision::Accept => Ok(ServerCertVerified::assertion()),
            TrustDecision::Reject => {
                warn!(%host, "trust evaluator rejected peer certificate");
                Err(TlsError::InvalidCertificate(
                    CertificateError::ApplicationVerificationFailure,
                ))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// TLS client config whose certificate decisions go to `trust`. ALPN advertises
/// `http/1.1` when `alpn_http11` is set.
pub fn client_config(
    trust: Arc<dyn TrustEvaluator>,
    alpn_http11: bool,
) -> io::Result<Arc<ClientConfig>> {
    let verifier = Arc::new(TrustHookVerifier::new(trust));
    let mut config = ClientConfig::builder_with_provider(verifier.provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    if alpn_http11 {
        config.alpn_protocols = vec![b"http/1.1".to_vec()];
    }
    Ok(Arc::new(config))
}
