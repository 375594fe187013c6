//! Per-source fingerprint -> DER cache.
//!
//! `CertSource::query_cert` is documented as possibly doing a second
//! network round trip; several backends (direct handshakes, CT aggregators
//! that fetch full DER eagerly) actually already have the bytes in hand by
//! the time the traversal engine asks for them, so they stash them here and
//! serve `query_cert` as a cache hit instead of re-dialing.

use certgraph_core::Fingerprint;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct DerCache {
    inner: RwLock<HashMap<Fingerprint, Vec<u8>>>,
}

impl DerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, fingerprint: Fingerprint, der: Vec<u8>) {
        self.inner.write().entry(fingerprint).or_insert(der);
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        self.inner.read().get(fingerprint).cloned()
    }
}
