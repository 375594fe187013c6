//! One-line-per-domain plaintext rendering.

use certgraph_core::DomainNode;

/// Either the bare domain, or `<domain> <depth> <statuses>` when `details`
/// is set. Statuses are rendered `source=STATUS`, sorted by source name for
/// deterministic output.
pub fn format_line(node: &DomainNode, details: bool) -> String {
    if !details {
        return node.domain.clone();
    }

    let mut sources: Vec<&String> = node.status.keys().collect();
    sources.sort();
    let statuses: Vec<String> = sources
        .into_iter()
        .map(|source| format!("{source}={:?}", node.status[source]))
        .collect();

    format!("{} {} {}", node.domain, node.depth, statuses.join(","))
}
