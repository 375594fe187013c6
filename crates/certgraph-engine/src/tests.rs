//! End-to-end scenarios driven by a deterministic in-memory mock source.
//! Mirrors the concrete scenarios 1-6 plus the monotonicity property
//! (`P=1` vs `P=16`) and termination.

use crate::{normalize_seed, normalize_seeds, Engine, EngineOptions};
use async_trait::async_trait;
use certgraph_core::{CertGraph, Fingerprint, Status};
use certgraph_sources::{CertResult, CertSource, QueryResult, SourceError, SourceResult};
use std::collections::HashMap;
use std::sync::Arc;

struct MockResponse {
    status: Status,
    fingerprints: Vec<Fingerprint>,
}

/// A fixed-script `CertSource`: each registered host returns a canned
/// status and, optionally, a fingerprint computed from its SAN set so that
/// two hosts sharing SANs resolve to the identical certificate (just as two
/// real hosts covered by the same cert would).
struct MockSource {
    name: &'static str,
    responses: HashMap<String, MockResponse>,
    certs: HashMap<Fingerprint, (Vec<String>, bool)>,
}

fn fingerprint_for(domains: &[&str]) -> Fingerprint {
    let mut sorted: Vec<&str> = domains.to_vec();
    sorted.sort_unstable();
    Fingerprint::from_der(sorted.join(",").as_bytes())
}

impl MockSource {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            responses: HashMap::new(),
            certs: HashMap::new(),
        }
    }

    /// `host` resolves to a cert covering `domains`, identified by a
    /// fingerprint derived from that SAN set.
    fn register(mut self, host: &str, status: Status, domains: &[&str], cdn: bool) -> Self {
        let fingerprint = fingerprint_for(domains);
        self.responses.insert(
            host.to_string(),
            MockResponse { status, fingerprints: vec![fingerprint] },
        );
        self.certs
            .entry(fingerprint)
            .or_insert_with(|| (domains.iter().map(|d| d.to_string()).collect(), cdn));
        self
    }
}

#[async_trait]
impl CertSource for MockSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn query(&self, host: &str) -> SourceResult<QueryResult> {
        match self.responses.get(host) {
            Some(resp) => {
                let mut result = QueryResult::new().with_status(host, resp.status);
                if !resp.fingerprints.is_empty() {
                    result = result.with_fingerprints(host, resp.fingerprints.clone());
                }
                Ok(result)
            }
            None => Ok(QueryResult::new().with_status(host, Status::Unknown)),
        }
    }

    async fn query_cert(&self, fingerprint: Fingerprint) -> SourceResult<CertResult> {
        match self.certs.get(&fingerprint) {
            Some((domains, cdn)) => Ok(CertResult {
                fingerprint,
                domains: domains.clone(),
                cdn_cert: *cdn,
                der: Vec::new(),
            }),
            None => Err(SourceError::CertNotFound(fingerprint.to_string())),
        }
    }
}

fn default_options(max_depth: u32) -> EngineOptions {
    EngineOptions {
        max_depth,
        parallel: 4,
        allow_cdn: true,
        max_sans: 0,
        expand_tldplus1: false,
        save_dir: None,
    }
}

/// Runs the engine to completion and returns the populated graph. If the
/// pending counter never reached zero the output channel would never
/// close and this would hang instead of returning — that hang is the
/// termination property's failure mode.
async fn run_to_completion(graph: Arc<CertGraph>, source: Arc<dyn CertSource>, seeds: Vec<String>, options: EngineOptions) {
    let engine = Engine::new(graph, source, options);
    let mut output = engine.run(seeds).unwrap();
    while output.recv().await.is_some() {}
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_1_depth_zero_drops_expansion_but_keeps_cert() {
    let source: Arc<dyn CertSource> =
        Arc::new(MockSource::new("mock").register("a.test", Status::Good, &["a.test", "b.test"], false));
    let graph = Arc::new(CertGraph::new());
    run_to_completion(graph.clone(), source, vec!["a.test".to_string()], default_options(0)).await;

    assert_eq!(graph.num_domains(), 1);
    assert_eq!(graph.num_certs(), 1);
    let node = graph.get_domain("a.test").unwrap();
    assert_eq!(node.depth, 0);
    assert!(node.root);
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_2_depth_one_links_both_domains() {
    let source: Arc<dyn CertSource> = Arc::new(
        MockSource::new("mock")
            .register("a.test", Status::Good, &["a.test", "b.test"], false)
            .register("b.test", Status::Good, &["a.test", "b.test"], false),
    );
    let graph = Arc::new(CertGraph::new());
    run_to_completion(graph.clone(), source, vec!["a.test".to_string()], default_options(1)).await;

    assert_eq!(graph.num_domains(), 2);
    assert_eq!(graph.num_certs(), 1);
    let a = graph.get_domain("a.test").unwrap();
    assert_eq!(a.depth, 0);
    assert!(a.root);
    let b = graph.get_domain("b.test").unwrap();
    assert_eq!(b.depth, 1);
    assert!(!b.root);
    assert!(!a.certs["mock"].is_empty());
    assert!(!b.certs["mock"].is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_3_sanscap_excludes_wide_certs() {
    let source: Arc<dyn CertSource> = Arc::new(MockSource::new("mock").register(
        "a.test",
        Status::Good,
        &["a.test", "b.test", "c.test"],
        false,
    ));
    let graph = Arc::new(CertGraph::new());
    let mut options = default_options(5);
    options.max_sans = 2;
    run_to_completion(graph.clone(), source, vec!["a.test".to_string()], options).await;

    assert_eq!(graph.num_domains(), 1);
    assert!(graph.get_domain("b.test").is_none());
    assert!(graph.get_domain("c.test").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_4_trailing_dot_seeds_dedup() {
    let source: Arc<dyn CertSource> = Arc::new(MockSource::new("mock"));
    let graph = Arc::new(CertGraph::new());
    let seeds = normalize_seeds(&["a.test".to_string(), "a.test.".to_string()], false);
    run_to_completion(graph.clone(), source, seeds, default_options(0)).await;

    assert_eq!(graph.num_domains(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_5_url_seed_normalizes_to_host() {
    let source: Arc<dyn CertSource> = Arc::new(MockSource::new("mock"));
    let graph = Arc::new(CertGraph::new());
    let seed = normalize_seed("https://a.test:443/path");
    run_to_completion(graph.clone(), source, vec![seed], default_options(0)).await;

    assert_eq!(graph.num_domains(), 1);
    assert!(graph.get_domain("a.test").is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_6_shared_fingerprint_is_not_double_counted() {
    let source: Arc<dyn CertSource> = Arc::new(
        MockSource::new("mock")
            .register("a.test", Status::Good, &["a.test", "b.test"], false)
            .register("b.test", Status::Good, &["a.test", "b.test"], false),
    );
    let graph = Arc::new(CertGraph::new());
    run_to_completion(
        graph.clone(),
        source,
        vec!["a.test".to_string(), "b.test".to_string()],
        default_options(5),
    )
    .await;

    assert_eq!(graph.num_certs(), 1);
    let fingerprint = fingerprint_for(&["a.test", "b.test"]);
    let cert = graph.get_cert(&fingerprint).unwrap();
    assert_eq!(cert.found.len(), 1);
    assert!(cert.found.contains("mock"));
}

fn chain_source() -> MockSource {
    MockSource::new("mock")
        .register("a.test", Status::Good, &["a.test", "b.test", "c.test"], false)
        .register("b.test", Status::Good, &["b.test", "d.test"], false)
        .register("c.test", Status::Good, &["c.test", "e.test"], false)
        .register("d.test", Status::Good, &["d.test"], false)
        .register("e.test", Status::Good, &["e.test"], false)
}

async fn run_chain(parallel: usize) -> certgraph_core::GraphMap {
    let source: Arc<dyn CertSource> = Arc::new(chain_source());
    let graph = Arc::new(CertGraph::new());
    let mut options = default_options(5);
    options.parallel = parallel;
    run_to_completion(graph.clone(), source, vec!["a.test".to_string()], options).await;
    graph.generate_map()
}

#[tokio::test(flavor = "multi_thread")]
async fn monotonicity_across_parallelism() {
    let low = run_chain(1).await;
    let high = run_chain(16).await;

    let low_domains: Vec<_> = low.domains.iter().map(|d| d.domain.clone()).collect();
    let high_domains: Vec<_> = high.domains.iter().map(|d| d.domain.clone()).collect();
    assert_eq!(low_domains, high_domains);

    let low_certs: Vec<_> = low.certificates.iter().map(|c| c.fingerprint).collect();
    let high_certs: Vec<_> = high.certificates.iter().map(|c| c.fingerprint).collect();
    assert_eq!(low_certs, high_certs);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_empty_seed_list() {
    let source: Arc<dyn CertSource> = Arc::new(MockSource::new("mock"));
    let graph = Arc::new(CertGraph::new());
    let engine = Engine::new(graph, source, default_options(1));
    assert!(matches!(engine.run(vec![]), Err(crate::EngineError::NoSeeds)));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_zero_parallelism() {
    let source: Arc<dyn CertSource> = Arc::new(MockSource::new("mock"));
    let graph = Arc::new(CertGraph::new());
    let mut options = default_options(1);
    options.parallel = 0;
    let engine = Engine::new(graph, source, options);
    assert!(matches!(
        engine.run(vec!["a.test".to_string()]),
        Err(crate::EngineError::InvalidParallelism(_))
    ));
}
