//! The thread-safe bipartite domain/certificate store.

use crate::cert::CertNode;
use crate::domain::DomainNode;
use crate::fingerprint::Fingerprint;
use crate::suffix::{registrable_parent, strip_wildcard};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// Owns two deduplicating maps keyed by normalized `Domain` and by
/// `Fingerprint`. A single read/write lock serializes every mutation and
/// every read that could race with one — the graph is the sole point of
/// synchronization between concurrent traversal workers.
#[derive(Default)]
pub struct CertGraph {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    by_domain: HashMap<String, DomainNode>,
    by_fingerprint: HashMap<Fingerprint, CertNode>,
}

impl CertGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a hostname the way the graph keys on it: lowercase, no
    /// trailing dot.
    pub fn normalize_key(domain: &str) -> String {
        domain.trim_end_matches('.').to_lowercase()
    }

    /// Constant-time lookup on the normalized key. No side effect.
    pub fn get_domain(&self, domain: &str) -> Option<DomainNode> {
        let key = Self::normalize_key(domain);
        self.inner.read().by_domain.get(&key).cloned()
    }

    /// Insert `node` if its domain is absent. No-op (does not overwrite) if
    /// a node for the same domain already exists — this is the traversal
    /// engine's deduplication point.
    ///
    /// Returns `true` if the node was newly inserted.
    pub fn add_domain(&self, node: DomainNode) -> bool {
        let key = Self::normalize_key(&node.domain);
        let mut inner = self.inner.write();
        if inner.by_domain.contains_key(&key) {
            false
        } else {
            inner.by_domain.insert(key, node);
            true
        }
    }

    /// Apply `f` to the stored node for `domain`, if present.
    pub fn with_domain_mut<R>(&self, domain: &str, f: impl FnOnce(&mut DomainNode) -> R) -> Option<R> {
        let key = Self::normalize_key(domain);
        let mut inner = self.inner.write();
        inner.by_domain.get_mut(&key).map(f)
    }

    pub fn get_cert(&self, fingerprint: &Fingerprint) -> Option<CertNode> {
        self.inner.read().by_fingerprint.get(fingerprint).cloned()
    }

    /// Insert `cert` if absent; otherwise merge by unioning `found`.
    pub fn add_cert(&self, cert: CertNode) {
        let mut inner = self.inner.write();
        match inner.by_fingerprint.get_mut(&cert.fingerprint) {
            Some(existing) => {
                for source in &cert.found {
                    existing.found.insert(source.clone());
                }
            }
            None => {
                inner.by_fingerprint.insert(cert.fingerprint, cert);
            }
        }
    }

    /// Record that `source` reported an already-known fingerprint, without
    /// needing the full cert detail again. No-op (returns `false`) if no
    /// cert for `fingerprint` is in the graph yet.
    pub fn mark_cert_found(&self, fingerprint: &Fingerprint, source: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.by_fingerprint.get_mut(fingerprint) {
            Some(cert) => {
                cert.mark_found(source);
                true
            }
            None => false,
        }
    }

    /// For every CertNode associated with `domain` in any source, yield the
    /// hostnames in its SAN list (subject to `allow_cdn` and `max_sans`,
    /// counted by distinct registrable parent, `0` meaning unlimited).
    /// Wildcard SANs are canonicalized to their bare parent. The result is
    /// deduplicated, sorted ascending, and excludes `domain` itself.
    pub fn get_domain_neighbors(&self, domain: &str, allow_cdn: bool, max_sans: u32) -> Vec<String> {
        let key = Self::normalize_key(domain);
        let inner = self.inner.read();
        let Some(node) = inner.by_domain.get(&key) else {
            return Vec::new();
        };

        let mut neighbors = std::collections::BTreeSet::new();
        for fp in node.all_fingerprints() {
            let Some(cert) = inner.by_fingerprint.get(&fp) else {
                continue;
            };
            if !allow_cdn && cert.cdn_cert {
                continue;
            }
            if max_sans > 0 {
                let distinct_parents: std::collections::HashSet<String> = cert
                    .domains
                    .iter()
                    .filter_map(|d| registrable_parent(d).or_else(|| strip_wildcard(d).ok()))
                    .collect();
                if distinct_parents.len() as u32 > max_sans {
                    continue;
                }
            }
            for d in &cert.domains {
                if let Ok(stripped) = strip_wildcard(d) {
                    neighbors.insert(stripped);
                }
            }
        }
        neighbors.remove(&key);
        neighbors.into_iter().collect()
    }

    pub fn num_domains(&self) -> usize {
        self.inner.read().by_domain.len()
    }

    pub fn num_certs(&self) -> usize {
        self.inner.read().by_fingerprint.len()
    }

    /// The depth recorded for `domain`, if it has been inserted.
    pub fn domain_depth(&self, domain: &str) -> Option<u32> {
        let key = Self::normalize_key(domain);
        self.inner.read().by_domain.get(&key).map(|n| n.depth)
    }

    /// A JSON-serializable snapshot of the graph in stable sorted order.
    pub fn generate_map(&self) -> GraphMap {
        let inner = self.inner.read();

        let mut domains: Vec<DomainNode> = inner.by_domain.values().cloned().collect();
        domains.sort_by(|a, b| a.domain.cmp(&b.domain));

        let mut certificates: Vec<CertNode> = inner.by_fingerprint.values().cloned().collect();
        certificates.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

        GraphMap { domains, certificates }
    }
}

#[derive(Debug, Serialize)]
pub struct GraphMap {
    pub domains: Vec<DomainNode>,
    pub certificates: Vec<CertNode>,
}
