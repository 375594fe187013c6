//! Registrable-parent ("TLD+1") extraction, shared by the graph's SAN-count
//! cap and the traversal engine's seed normalizer.

use crate::error::{Error, Result};

/// Returns the shortest suffix of `host` that is one label longer than its
/// matched public suffix (e.g. `foo.bar.example.co.uk` -> `example.co.uk`).
///
/// Returns `None` if `host` has no registrable parent (it already is the
/// public suffix, or is malformed) — callers treat that as a silent failure
/// and keep using the original hostname.
pub fn registrable_parent(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.');
    psl::domain_str(host).map(|s| s.to_lowercase())
}

/// Strip a leading wildcard label (`*.example.com` -> `example.com`).
/// Hostnames without a wildcard label are returned unchanged.
///
/// Rejects SANs where `*` isn't a standalone leftmost label (`foo*.example.com`),
/// where it recurs past the first label (`*.*.example.com`), or where nothing
/// is left after stripping it (`*.`) — these aren't valid wildcard hostnames
/// and callers should drop the SAN rather than treat it as a real name.
pub fn strip_wildcard(host: &str) -> Result<String> {
    if let Some(rest) = host.strip_prefix("*.") {
        if rest.is_empty() || rest.contains('*') {
            return Err(Error::MalformedWildcard(host.to_string()));
        }
        return Ok(rest.to_lowercase());
    }
    if host.contains('*') {
        return Err(Error::MalformedWildcard(host.to_string()));
    }
    Ok(host.to_lowercase())
}
