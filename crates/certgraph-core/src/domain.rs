//! The domain (hostname) half of the bipartite graph.

use crate::Fingerprint;
use crate::Status;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A hostname discovered during traversal.
///
/// Created exactly once per distinct [`Self::domain`] by the traversal
/// engine at the moment the domain is first enqueued; populated by the
/// visiting worker; never destroyed during the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainNode {
    pub domain: String,
    pub depth: u32,
    pub root: bool,
    /// source name -> fingerprints that source associated with this domain.
    pub certs: HashMap<String, BTreeSet<Fingerprint>>,
    /// source name -> what that source observed when probing this domain.
    pub status: HashMap<String, Status>,
    /// Additional hostnames a source reported as related but which are not
    /// SANs of any certificate (e.g. MX hosts for SMTP).
    pub related: BTreeSet<String>,
}

impl DomainNode {
    pub fn new(domain: impl Into<String>, depth: u32, root: bool) -> Self {
        Self {
            domain: domain.into(),
            depth,
            root,
            certs: HashMap::new(),
            status: HashMap::new(),
            related: BTreeSet::new(),
        }
    }

    /// Record that `source` associated `fingerprint` with this domain.
    pub fn add_cert(&mut self, source: &str, fingerprint: Fingerprint) {
        self.certs
            .entry(source.to_string())
            .or_default()
            .insert(fingerprint);
    }

    /// Merge a source's reported status for this domain.
    pub fn set_status(&mut self, source: &str, status: Status) {
        self.status.insert(source.to_string(), status);
    }

    /// Record additional related hostnames (e.g. MX targets).
    pub fn add_related(&mut self, hosts: impl IntoIterator<Item = String>) {
        self.related.extend(hosts);
    }

    /// All fingerprints this node is associated with, across every source.
    pub fn all_fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.certs.values().flat_map(|set| set.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_cert_dedups_within_source() {
        let mut node = DomainNode::new("a.test", 0, true);
        let fp = Fingerprint::from_der(b"x");
        node.add_cert("crtsh", fp);
        node.add_cert("crtsh", fp);
        assert_eq!(node.certs["crtsh"].len(), 1);
    }

    #[test]
    fn status_is_keyed_per_source() {
        let mut node = DomainNode::new("a.test", 0, true);
        node.set_status("http", Status::Good);
        node.set_status("crtsh", Status::Unknown);
        assert_eq!(node.status.len(), 2);
        assert_eq!(node.status["http"], Status::Good);
    }
}
