//! certgraph - concurrent breadth-first certificate-graph crawler
//!
//! Starting from a set of seed hostnames, repeatedly queries a certificate
//! source for each host, extracts SAN hostnames from every certificate
//! found, and continues breadth-first until a depth bound is reached.

use anyhow::{anyhow, Context, Result};
use certgraph_core::CertGraph;
use certgraph_engine::{normalize_seeds, Engine, EngineOptions};
use certgraph_sink::{drain, emit_json, ScanMetadata, SinkOptions};
use certgraph_sources::build_driver;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// certgraph - map the domain graph induced by TLS certificates
#[derive(Parser, Debug)]
#[command(name = "certgraph")]
#[command(version, about, long_about = None)]
struct Args {
    /// Seed hostnames (bare host, or a URL to extract the host from)
    hosts: Vec<String>,

    /// TCP/operation timeout, seconds
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    /// Enable diagnostic logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Certificate source: http, smtp, crtsh, or google
    #[arg(long, default_value = "http")]
    driver: String,

    /// For CT drivers, broaden the search pattern to subdomains
    #[arg(long = "ct-subdomains")]
    ct_subdomains: bool,

    /// For CT drivers, include expired certificates
    #[arg(long = "ct-expired")]
    ct_expired: bool,

    /// Upper bound on distinct registrable parents per cert for neighbor
    /// expansion; 0 disables the cap
    #[arg(long, default_value = "80")]
    sanscap: u32,

    /// Do not skip certs flagged as CDN-issued
    #[arg(long)]
    cdn: bool,

    /// Post-visit NS-record probe
    #[arg(long)]
    ns: bool,

    /// Also enqueue each domain's registrable parent
    #[arg(long)]
    tldplus1: bool,

    /// Maximum BFS depth
    #[arg(long, default_value = "5")]
    depth: u32,

    /// Worker pool size; must be >= 1
    #[arg(short, long, default_value = "10")]
    parallel: i64,

    /// Emit a detailed per-domain output line
    #[arg(long)]
    details: bool,

    /// Emit the final graph as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Directory to persist certs in textual DER-armored form
    #[arg(long)]
    save: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("certgraph v{}", env!("CARGO_PKG_VERSION"));

    if args.hosts.is_empty() {
        return Err(anyhow!("no seed hosts supplied"));
    }
    if args.parallel < 1 {
        return Err(anyhow!("parallel must be >= 1, got {}", args.parallel));
    }

    let timeout = Duration::from_secs(args.timeout);
    let source = build_driver(&args.driver, timeout, args.ct_subdomains, args.ct_expired)
        .ok_or_else(|| anyhow!("unknown driver: {}", args.driver))?;

    if let Some(dir) = &args.save {
        std::fs::create_dir_all(dir).with_context(|| format!("creating save directory {}", dir.display()))?;
    }

    let command = std::env::args().collect::<Vec<_>>().join(" ");
    let options_map = effective_options(&args);

    let graph = Arc::new(CertGraph::new());
    let engine_options = EngineOptions {
        max_depth: args.depth,
        parallel: args.parallel as usize,
        allow_cdn: args.cdn,
        max_sans: args.sanscap,
        expand_tldplus1: args.tldplus1,
        save_dir: args.save.clone(),
    };

    let seeds = normalize_seeds(&args.hosts, args.tldplus1);
    let engine = Engine::new(graph.clone(), source, engine_options);
    let output = engine.run(seeds)?;

    let sink_options = SinkOptions { json: args.json, details: args.details, check_ns: args.ns };
    drain(output, sink_options).await;

    if args.json {
        let scan_date = chrono::Utc::now().to_rfc3339();
        let metadata = ScanMetadata::new(command, options_map, scan_date);
        emit_json(&graph, &metadata).context("emitting JSON report")?;
    }

    Ok(())
}

fn effective_options(args: &Args) -> BTreeMap<String, String> {
    let mut options = BTreeMap::new();
    options.insert("timeout".to_string(), args.timeout.to_string());
    options.insert("driver".to_string(), args.driver.clone());
    options.insert("ct_subdomains".to_string(), args.ct_subdomains.to_string());
    options.insert("ct_expired".to_string(), args.ct_expired.to_string());
    options.insert("sanscap".to_string(), args.sanscap.to_string());
    options.insert("cdn".to_string(), args.cdn.to_string());
    options.insert("ns".to_string(), args.ns.to_string());
    options.insert("tldplus1".to_string(), args.tldplus1.to_string());
    options.insert("depth".to_string(), args.depth.to_string());
    options.insert("parallel".to_string(), args.parallel.to_string());
    options.insert("details".to_string(), args.details.to_string());
    options.insert("json".to_string(), args.json.to_string());
    options.insert(
        "save".to_string(),
        args.save.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
    );
    options
}
