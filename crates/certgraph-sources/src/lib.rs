//! The [`CertSource`] interface and its four concrete backends: direct
//! HTTPS, direct SMTP (STARTTLS), and two CT-log aggregators.

mod cache;
mod crtsh;
mod error;
mod google;
mod https;
mod persist;
mod smtp;
mod source;
mod tls_dial;
mod x509util;

pub use crtsh::CrtShSource;
pub use error::{SourceError, SourceResult};
pub use google::GoogleCtSource;
pub use https::HttpsSource;
pub use persist::save_cert_pem;
pub use smtp::SmtpSource;
pub use source::{CertResult, CertSource, QueryResult};

use std::sync::Arc;
use std::time::Duration;

/// Build the named backend, matching `--driver`. Returns `None` for an
/// unrecognized name — the caller treats that as a fatal pre-flight error.
pub fn build_driver(
    name: &str,
    timeout: Duration,
    ct_subdomains: bool,
    ct_expired: bool,
) -> Option<Arc<dyn CertSource>> {
    match name {
        https::NAME => Some(Arc::new(HttpsSource::new(timeout))),
        smtp::NAME => Some(Arc::new(SmtpSource::new(timeout))),
        crtsh::NAME => Some(Arc::new(CrtShSource::new(timeout, ct_subdomains, ct_expired))),
        google::NAME => Some(Arc::new(GoogleCtSource::new(timeout, ct_subdomains, ct_expired))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_driver_recognizes_all_four_names() {
        for name in ["http", "smtp", "crtsh", "google"] {
            assert!(build_driver(name, Duration::from_secs(1), false, false).is_some());
        }
    }

    #[test]
    fn build_driver_rejects_unknown_names() {
        assert!(build_driver("carrier-pigeon", Duration::from_secs(1), false, false).is_none());
    }
}
