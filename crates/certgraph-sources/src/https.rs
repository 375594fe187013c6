//! Direct HTTPS backend: dial `host:443`, handshake with SNI, extract the
//! peer certificate.

use crate::cache::DerCache;
use crate::error::{SourceError, SourceResult};
use crate::source::{CertResult, CertSource, QueryResult};
use crate::tls_dial::dial_tls;
use crate::x509util::{extract_hostnames, looks_like_cdn_cert};
use async_trait::async_trait;
use certgraph_core::{Fingerprint, Status};
use std::time::Duration;

pub const NAME: &str = "http";

pub struct HttpsSource {
    timeout: Duration,
    cache: DerCache,
}

impl HttpsSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cache: DerCache::new(),
        }
    }
}

#[async_trait]
impl CertSource for HttpsSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn query(&self, host: &str) -> SourceResult<QueryResult> {
        let outcome = dial_tls(host, 443, self.timeout).await;

        let (status, chain) = match outcome {
            Ok((_stream, chain)) if chain.is_empty() => (Status::Unknown, Vec::new()),
            Ok((_stream, chain)) => (Status::Good, chain),
            Err(SourceError::Timeout { .. }) => (Status::Timeout, Vec::new()),
            Err(SourceError::Connect { .. }) => (Status::Refused, Vec::new()),
            Err(other) => return Err(other),
        };

        let mut result = QueryResult::new().with_status(host, status);

        if let Some(leaf_der) = chain.into_iter().next() {
            let fingerprint = Fingerprint::from_der(&leaf_der);
            self.cache.insert(fingerprint, leaf_der);
            result = result.with_fingerprints(host, vec![fingerprint]);
        }

        Ok(result)
    }

    async fn query_cert(&self, fingerprint: Fingerprint) -> SourceResult<CertResult> {
        let der = self
            .cache
            .get(&fingerprint)
            .ok_or_else(|| SourceError::CertNotFound(fingerprint.to_string()))?;

        Ok(CertResult {
            fingerprint,
            domains: extract_hostnames(&der)?,
            cdn_cert: looks_like_cdn_cert(&der),
            der,
        })
    }
}
