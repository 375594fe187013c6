//! The [`CertSource`] contract every backend implements.

use crate::error::SourceResult;
use async_trait::async_trait;
use certgraph_core::{Fingerprint, Status};
use std::collections::HashMap;

/// What a single [`CertSource::query`] call observed for a host.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Hostname -> status observed when probing it.
    status: HashMap<String, Status>,
    /// Additional hostnames to inject into the BFS frontier that are not
    /// SANs of any certificate (e.g. MX targets for SMTP).
    related: Vec<String>,
    /// Hostname -> fingerprints seen for it. The queried host is always a
    /// key; some sources also key fingerprints by other hostnames
    /// encountered mid-query (those extra keys are intentionally unused by
    /// the traversal engine — see the open question in DESIGN.md).
    fingerprints: HashMap<String, Vec<Fingerprint>>,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, host: impl Into<String>, status: Status) -> Self {
        self.status.insert(host.into(), status);
        self
    }

    pub fn with_related(mut self, hosts: impl IntoIterator<Item = String>) -> Self {
        self.related.extend(hosts);
        self
    }

    pub fn with_fingerprints(mut self, host: impl Into<String>, fps: Vec<Fingerprint>) -> Self {
        self.fingerprints.insert(host.into(), fps);
        self
    }

    pub fn status(&self) -> &HashMap<String, Status> {
        &self.status
    }

    pub fn related(&self) -> &[String] {
        &self.related
    }

    pub fn fingerprints(&self) -> &HashMap<String, Vec<Fingerprint>> {
        &self.fingerprints
    }
}

/// The full detail of a single certificate, fetched by fingerprint.
#[derive(Debug, Clone)]
pub struct CertResult {
    pub fingerprint: Fingerprint,
    /// Ordered, deduplicated, lowercase hostnames from CN + SANs.
    pub domains: Vec<String>,
    pub cdn_cert: bool,
    /// Raw DER bytes, handed back so the engine can persist them when
    /// `--save` is set. Backends that can't recover the original bytes may
    /// leave this empty; persistence is then silently skipped for that cert.
    pub der: Vec<u8>,
}

/// Uniform contract implemented by each backend: given a hostname, return
/// certificates and the domains they reference.
///
/// Implementations may perform network I/O and may time out; a failed
/// `query` or `query_cert` is non-fatal to the traversal (see
/// [`crate::error::SourceError`]).
#[async_trait]
pub trait CertSource: Send + Sync {
    /// Short identifier used in status maps and `found` sets.
    fn name(&self) -> &str;

    /// Query certificates and related hostnames for `host`.
    async fn query(&self, host: &str) -> SourceResult<QueryResult>;

    /// Fetch full detail for a fingerprint returned by a prior `query` call.
    async fn query_cert(&self, fingerprint: Fingerprint) -> SourceResult<CertResult>;
}
