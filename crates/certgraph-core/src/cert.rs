//! The certificate half of the bipartite graph.

use crate::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A distinct certificate observed via some source.
///
/// Created on first observation of a fingerprint; [`Self::found`] grows
/// monotonically if the same fingerprint is later returned by other sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertNode {
    pub fingerprint: Fingerprint,
    /// Ordered, deduplicated, lowercase hostnames from CN + SANs.
    pub domains: Vec<String>,
    /// Source names that reported this certificate.
    pub found: BTreeSet<String>,
    /// True iff the certificate is known to belong to a CDN (policy hook).
    pub cdn_cert: bool,
}

impl CertNode {
    pub fn new(fingerprint: Fingerprint, domains: Vec<String>, cdn_cert: bool) -> Self {
        let mut domains = domains;
        dedup_lowercase_preserve_order(&mut domains);
        Self {
            fingerprint,
            domains,
            found: BTreeSet::new(),
            cdn_cert,
        }
    }

    /// Union `source` into this cert's `found` set. Returns `true` if it was
    /// newly inserted (the `Found` set grew).
    pub fn mark_found(&mut self, source: &str) -> bool {
        self.found.insert(source.to_string())
    }
}

fn dedup_lowercase_preserve_order(domains: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    domains.retain(|d| {
        let lower = d.to_lowercase();
        let fresh = seen.insert(lower.clone());
        fresh
    });
    for d in domains.iter_mut() {
        *d = d.to_lowercase();
    }
}
