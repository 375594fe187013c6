//! Top-level `certgraph` metadata object merged alongside the graph payload
//! in JSON mode.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ScanMetadata {
    pub version: String,
    pub website: String,
    pub scan_date: String,
    pub command: String,
    pub options: BTreeMap<String, String>,
}

impl ScanMetadata {
    pub fn new(command: String, options: BTreeMap<String, String>, scan_date: String) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            website: "https://github.com/certgraph/certgraph".to_string(),
            scan_date,
            command,
            options,
        }
    }
}
