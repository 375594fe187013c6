//! Shared raw-TLS-handshake plumbing for the direct HTTPS and direct SMTP
//! backends: dial, upgrade, hand back the peer certificate chain.
//!
//! Crawling has to complete a handshake against self-signed, expired, or
//! otherwise untrusted certificates — that's the data we're here to collect,
//! not something to reject — so the verifier accepts any chain and lets the
//! caller classify what it saw.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::Duration;
use tokio_rustls::{client::TlsStream, TlsConnector};

use crate::error::SourceError;

#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
        ]
    }
}

fn connector() -> TlsConnector {
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Dial `host:port`, perform a TLS handshake with SNI = `host`, and return
/// the established stream plus the peer's DER certificate chain (leaf
/// first). `timeout` bounds both the TCP connect and the handshake.
pub async fn dial_tls(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<(TlsStream<TcpStream>, Vec<Vec<u8>>), SourceError> {
    let tcp = connect_tcp(host, port, timeout).await?;
    handshake(host, tcp, timeout).await
}

/// Dial and hand back a plaintext TCP stream without upgrading — used by
/// the SMTP backend, which must speak plaintext until `STARTTLS`.
pub async fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, SourceError> {
    let addr = format!("{host}:{port}");
    tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| SourceError::Timeout { host: host.to_string() })?
        .map_err(|_| SourceError::Connect {
            host: host.to_string(),
            port,
        })
}

/// Upgrade an already-connected plaintext stream to TLS with SNI = `host`.
pub async fn handshake(
    host: &str,
    tcp: TcpStream,
    timeout: Duration,
) -> Result<(TlsStream<TcpStream>, Vec<Vec<u8>>), SourceError> {
    let server_name = ServerName::try_from(host.to_string()).map_err(|_| SourceError::Tls {
        host: host.to_string(),
        message: "invalid server name for SNI".to_string(),
    })?;

    let tls_stream = tokio::time::timeout(timeout, connector().connect(server_name, tcp))
        .await
        .map_err(|_| SourceError::Timeout { host: host.to_string() })?
        .map_err(|e| SourceError::Tls {
            host: host.to_string(),
            message: e.to_string(),
        })?;

    let chain: Vec<Vec<u8>> = tls_stream
        .get_ref()
        .1
        .peer_certificates()
        .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
        .unwrap_or_default();

    Ok((tls_stream, chain))
}
