//! Consumes the engine's output queue: either streams plaintext lines as
//! nodes arrive, or silently accumulates them for a single JSON emission at
//! the end. Single-threaded by construction (one `Sink::drain` call per
//! run) so output interleaving is deterministic for a given input order.

use crate::metadata::ScanMetadata;
use crate::ns::is_missing_ns;
use crate::plaintext::format_line;
use certgraph_core::{CertGraph, DomainNode};
use serde::Serialize;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct SinkOptions {
    pub json: bool,
    pub details: bool,
    pub check_ns: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    certgraph: &'a ScanMetadata,
    #[serde(flatten)]
    graph: certgraph_core::GraphMap,
}

/// Drains `output` to completion, writing plaintext as nodes arrive when
/// `options.json` is false. Returns once the channel is closed and drained
/// (i.e. once the traversal has terminated).
pub async fn drain(mut output: mpsc::Receiver<DomainNode>, options: SinkOptions) {
    while let Some(node) = output.recv().await {
        if options.json {
            continue;
        }
        println!("{}", format_line(&node, options.details));
        if options.check_ns && is_missing_ns(&node.domain).await {
            println!("Missing NS: {}", node.domain);
        }
    }
}

/// Emits the final graph as pretty JSON to stdout, merging `metadata`
/// alongside the `domains`/`certificates` arrays.
pub fn emit_json(graph: &CertGraph, metadata: &ScanMetadata) -> std::io::Result<()> {
    let report = JsonReport { certgraph: metadata, graph: graph.generate_map() };
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match serde_json::to_writer_pretty(&mut handle, &report) {
        Ok(()) => {
            writeln!(handle)?;
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "failed to serialize graph as JSON");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certgraph_core::Fingerprint;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn drain_consumes_until_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(DomainNode::new("a.test", 0, true)).await.unwrap();
        drop(tx);
        drain(rx, SinkOptions { json: true, details: false, check_ns: false }).await;
    }

    #[test]
    fn json_report_round_trips_graph_shape() {
        let graph = CertGraph::new();
        graph.add_domain(DomainNode::new("a.test", 0, true));
        let fp = Fingerprint::from_der(b"x");
        let mut cert = certgraph_core::CertNode::new(fp, vec!["a.test".into()], false);
        cert.mark_found("http");
        graph.add_cert(cert);

        let metadata = ScanMetadata::new("certgraph a.test".into(), BTreeMap::new(), "2024-01-01T00:00:00Z".into());
        let report = JsonReport { certgraph: &metadata, graph: graph.generate_map() };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["certgraph"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["domains"][0]["domain"], "a.test");
        assert_eq!(value["certificates"][0]["fingerprint"], fp.to_string());
    }
}
