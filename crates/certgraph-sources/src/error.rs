//! Errors a [`crate::CertSource`] backend can surface.
//!
//! All of these are non-fatal to the traversal: the worker that receives one
//! logs it under `--verbose` and leaves the affected node in the graph with
//! whatever state it already had.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("connection to {host}:{port} refused or unreachable")]
    Connect { host: String, port: u16 },

    #[error("operation on {host} timed out")]
    Timeout { host: String },

    #[error("TLS handshake with {host} failed: {message}")]
    Tls { host: String, message: String },

    #[error("protocol error talking to {host}: {message}")]
    Protocol { host: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("no certificate found for fingerprint {0}")]
    CertNotFound(String),

    #[error("failed to parse certificate: {0}")]
    CertParse(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
