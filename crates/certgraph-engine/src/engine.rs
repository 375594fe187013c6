//! Bounded-concurrency BFS over a [`CertGraph`], driven by a [`CertSource`].
//!
//! The dispatcher reads the input queue and, for each surviving node,
//! spawns a worker task; workers are their own producers, sending newly
//! discovered successors back onto the same queue (the self-refilling
//! queue design — see `pending` for the termination detector this relies
//! on).

use certgraph_core::{registrable_parent, CertGraph, CertNode, DomainNode};
use certgraph_sources::CertSource;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::pending::PendingCounter;

/// Small bounded capacity: backpressure should be felt quickly, per the
/// resource model (queues hold single-digit elements).
const QUEUE_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_depth: u32,
    pub parallel: usize,
    pub allow_cdn: bool,
    pub max_sans: u32,
    pub expand_tldplus1: bool,
    pub save_dir: Option<std::path::PathBuf>,
}

struct QueueItem {
    domain: String,
    depth: u32,
    root: bool,
}

pub struct Engine {
    graph: Arc<CertGraph>,
    source: Arc<dyn CertSource>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(graph: Arc<CertGraph>, source: Arc<dyn CertSource>, options: EngineOptions) -> Self {
        Self { graph, source, options }
    }

    /// Starts the traversal and returns the output queue. The channel
    /// closes once the pending counter (enqueued minus finished) reaches
    /// zero — every node has been visited, depth-dropped, or dedup-dropped,
    /// and every worker has released its permit.
    pub fn run(self, seeds: Vec<String>) -> Result<mpsc::Receiver<DomainNode>> {
        if seeds.is_empty() {
            return Err(EngineError::NoSeeds);
        }
        if self.options.parallel < 1 {
            return Err(EngineError::InvalidParallelism(self.options.parallel as i64));
        }

        let (input_tx, mut input_rx) = mpsc::channel::<QueueItem>(QUEUE_CAPACITY);
        let (output_tx, output_rx) = mpsc::channel::<DomainNode>(QUEUE_CAPACITY);
        let permits = Arc::new(Semaphore::new(self.options.parallel));
        let pending = PendingCounter::new();
        let options = Arc::new(self.options);
        let graph = self.graph;
        let source = self.source;

        // Seeding runs as its own task so a full input queue never blocks
        // the dispatcher loop below.
        {
            let input_tx = input_tx.clone();
            let pending = pending.clone();
            tokio::spawn(async move {
                for domain in seeds {
                    pending.increment();
                    if input_tx
                        .send(QueueItem { domain, depth: 0, root: true })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }

        // A separate watcher closes the dispatcher loop the instant pending
        // hits zero. By then the input queue is provably empty: an item
        // only sits in the channel between its `increment` and the
        // `decrement` that follows its processing, so pending == 0 implies
        // no in-flight item remains to be lost.
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        {
            let pending = pending.clone();
            tokio::spawn(async move {
                pending.wait_for_zero().await;
                let _ = shutdown_tx.send(());
            });
        }

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    item = input_rx.recv() => {
                        let Some(item) = item else { break };
                        dispatch(item, &graph, &source, &options, &input_tx, &output_tx, &permits, &pending);
                    }
                }
            }
        });

        Ok(output_rx)
    }
}

/// Steps 1–2 of the per-node protocol: depth bound and dedup-at-insert.
/// Survivors are handed to a freshly spawned worker task for step 3.
fn dispatch(
    item: QueueItem,
    graph: &Arc<CertGraph>,
    source: &Arc<dyn CertSource>,
    options: &Arc<EngineOptions>,
    input_tx: &mpsc::Sender<QueueItem>,
    output_tx: &mpsc::Sender<DomainNode>,
    permits: &Arc<Semaphore>,
    pending: &PendingCounter,
) {
    if item.depth > options.max_depth {
        pending.decrement();
        return;
    }

    let node = DomainNode::new(item.domain.clone(), item.depth, item.root);
    if !graph.add_domain(node) {
        pending.decrement();
        return;
    }

    let graph = graph.clone();
    let source = source.clone();
    let options = options.clone();
    let input_tx = input_tx.clone();
    let output_tx = output_tx.clone();
    let permits = permits.clone();
    let pending = pending.clone();

    tokio::spawn(async move {
        visit(item.domain, item.depth, graph, source, options, input_tx, output_tx, permits, pending).await;
    });
}

/// Step 3 of the protocol: acquire a permit, query, mutate the graph,
/// expand neighbors, publish, release.
#[allow(clippy::too_many_arguments)]
async fn visit(
    domain: String,
    depth: u32,
    graph: Arc<CertGraph>,
    source: Arc<dyn CertSource>,
    options: Arc<EngineOptions>,
    input_tx: mpsc::Sender<QueueItem>,
    output_tx: mpsc::Sender<DomainNode>,
    permits: Arc<Semaphore>,
    pending: PendingCounter,
) {
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            pending.decrement();
            return;
        }
    };

    let query_result = match source.query(&domain).await {
        Ok(result) => result,
        Err(err) => {
            warn!(%domain, source = source.name(), error = %err, "query failed, leaving node as visited");
            pending.decrement();
            return;
        }
    };

    for (host, status) in query_result.status() {
        let status = *status;
        let source_name = source.name().to_string();
        graph.with_domain_mut(host, |n| n.set_status(&source_name, status));
    }

    let related: Vec<String> = query_result.related().to_vec();
    if !related.is_empty() {
        let to_record = related.clone();
        graph.with_domain_mut(&domain, |n| n.add_related(to_record));
        for host in related {
            pending.increment();
            if input_tx
                .send(QueueItem { domain: host, depth: depth + 1, root: false })
                .await
                .is_err()
            {
                pending.decrement();
            }
        }
    }

    if let Some(fingerprints) = query_result.fingerprints().get(&domain) {
        for fingerprint in fingerprints {
            if !graph.mark_cert_found(fingerprint, source.name()) {
                match source.query_cert(*fingerprint).await {
                    Ok(cert_result) => {
                        let mut cert_node =
                            CertNode::new(cert_result.fingerprint, cert_result.domains, cert_result.cdn_cert);
                        cert_node.mark_found(source.name());
                        graph.add_cert(cert_node);

                        if let Some(dir) = &options.save_dir {
                            if !cert_result.der.is_empty() {
                                if let Err(err) =
                                    certgraph_sources::save_cert_pem(dir, &cert_result.fingerprint, &cert_result.der)
                                        .await
                                {
                                    warn!(fingerprint = %fingerprint, error = %err, "failed to persist certificate");
                                }
                            }
                        }
                    }
                    Err(err) => {
                        warn!(fingerprint = %fingerprint, source = source.name(), error = %err, "cert fetch failed, omitting from graph");
                        continue;
                    }
                }
            }
            graph.with_domain_mut(&domain, |n| n.add_cert(source.name(), *fingerprint));
        }
    }

    let neighbors = graph.get_domain_neighbors(&domain, options.allow_cdn, options.max_sans);
    for neighbor in neighbors {
        pending.increment();
        if input_tx
            .send(QueueItem { domain: neighbor.clone(), depth: depth + 1, root: false })
            .await
            .is_err()
        {
            pending.decrement();
        }

        if options.expand_tldplus1 {
            if let Some(parent) = registrable_parent(&neighbor) {
                pending.increment();
                if input_tx
                    .send(QueueItem { domain: parent, depth: depth + 1, root: false })
                    .await
                    .is_err()
                {
                    pending.decrement();
                }
            }
        }
    }

    if let Some(visited) = graph.get_domain(&domain) {
        let _ = output_tx.send(visited).await;
    }

    pending.decrement();
}
