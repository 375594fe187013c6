//! Post-visit NS-record probe: reports when a domain's registrable parent
//! has no nameservers, which usually means the domain isn't registered.

use certgraph_core::registrable_parent;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;

/// Returns `true` if `domain`'s registrable parent has no NS records (or the
/// lookup returns NXDOMAIN) — the caller should then print
/// `Missing NS: <domain>`. NXDOMAIN/NODATA responses surface as
/// `Err(ResolveErrorKind::NoRecordsFound)`, not as an empty `Ok`, so that
/// variant counts as "missing" too. Other errors (timeout, refused, server
/// failure) are fail-open: never claim unregistered on a transient resolver
/// error.
pub async fn is_missing_ns(domain: &str) -> bool {
    let Some(parent) = registrable_parent(domain) else {
        return false;
    };

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    match resolver.ns_lookup(parent.as_str()).await {
        Ok(lookup) => lookup.iter().next().is_none(),
        Err(err) => matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }),
    }
}
