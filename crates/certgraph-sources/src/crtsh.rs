//! CT aggregator backend: crt.sh.
//!
//! Queries crt.sh's JSON endpoint by domain, downloads each matched
//! certificate's DER once (crt.sh doesn't hand back a SHA-256 fingerprint in
//! the search response, only a log-entry id), computes the fingerprint
//! locally, and caches the DER for `query_cert`.

use crate::cache::DerCache;
use crate::error::{SourceError, SourceResult};
use crate::source::{CertResult, CertSource, QueryResult};
use crate::x509util::{extract_hostnames, looks_like_cdn_cert};
use async_trait::async_trait;
use certgraph_core::{Fingerprint, Status};
use serde::Deserialize;
use std::time::Duration;

pub const NAME: &str = "crtsh";

/// One row of crt.sh's `output=json` search response.
#[derive(Debug, Deserialize)]
struct CrtShEntry {
    id: u64,
    #[serde(default)]
    name_value: String,
    #[serde(default)]
    not_after: Option<String>,
}

pub struct CrtShSource {
    client: reqwest::Client,
    base_url: String,
    include_subdomains: bool,
    include_expired: bool,
    cache: DerCache,
}

impl CrtShSource {
    pub fn new(timeout: Duration, include_subdomains: bool, include_expired: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            client,
            base_url: "https://crt.sh".to_string(),
            include_subdomains,
            include_expired,
            cache: DerCache::new(),
        }
    }

    fn search_pattern(&self, host: &str) -> String {
        if self.include_subdomains {
            format!("%.{host}")
        } else {
            host.to_string()
        }
    }

    async fn download_der(&self, id: u64) -> SourceResult<Vec<u8>> {
        let url = format!("{}/?d={}", self.base_url, id);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::HttpStatus {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CertSource for CrtShSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn query(&self, host: &str) -> SourceResult<QueryResult> {
        let url = format!(
            "{}/?q={}&output=json",
            self.base_url,
            self.search_pattern(host)
        );

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::HttpStatus {
                status: resp.status().as_u16(),
                url,
            });
        }

        let entries: Vec<CrtShEntry> = resp.json().await?;
        if entries.is_empty() {
            return Ok(QueryResult::new().with_status(host, Status::Unknown));
        }

        let mut fingerprints = Vec::new();
        for entry in dedup_by_name_value(&entries) {
            if !self.include_expired {
                if let Some(not_after) = &entry.not_after {
                    if let Ok(expiry) = chrono_parse_date(not_after) {
                        if expiry < now_unix() {
                            continue;
                        }
                    }
                }
            }

            match self.download_der(entry.id).await {
                Ok(der) => {
                    let fingerprint = Fingerprint::from_der(&der);
                    self.cache.insert(fingerprint, der);
                    fingerprints.push(fingerprint);
                }
                Err(_) => continue,
            }
        }

        let result = QueryResult::new()
            .with_status(host, Status::Good)
            .with_fingerprints(host, fingerprints);
        Ok(result)
    }

    async fn query_cert(&self, fingerprint: Fingerprint) -> SourceResult<CertResult> {
        let der = self
            .cache
            .get(&fingerprint)
            .ok_or_else(|| SourceError::CertNotFound(fingerprint.to_string()))?;

        Ok(CertResult {
            fingerprint,
            domains: extract_hostnames(&der)?,
            cdn_cert: looks_like_cdn_cert(&der),
            der,
        })
    }
}

/// crt.sh timestamps look like `2024-01-02T03:04:05`; treat anything we
/// can't parse as "not expired" rather than silently dropping the cert.
fn chrono_parse_date(s: &str) -> Result<i64, ()> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| ())
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// crt.sh lists the precert and the issued leaf as separate rows with an
/// identical `name_value` SAN list; downloading both would fetch the same
/// certificate bytes twice, so only the first entry per distinct
/// `name_value` is kept.
fn dedup_by_name_value(entries: &[CrtShEntry]) -> Vec<&CrtShEntry> {
    let mut seen = std::collections::HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(entry.name_value.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_widens_for_subdomains() {
        let source = CrtShSource::new(Duration::from_secs(5), true, false);
        assert_eq!(source.search_pattern("example.com"), "%.example.com");
    }

    #[test]
    fn search_pattern_is_exact_by_default() {
        let source = CrtShSource::new(Duration::from_secs(5), false, false);
        assert_eq!(source.search_pattern("example.com"), "example.com");
    }

    #[test]
    fn name_is_crtsh() {
        let source = CrtShSource::new(Duration::from_secs(5), false, false);
        assert_eq!(source.name(), "crtsh");
    }

    #[test]
    fn dedup_keeps_first_id_per_name_value() {
        let entries = vec![
            CrtShEntry { id: 1, name_value: "a.test\nb.test".into(), not_after: None },
            CrtShEntry { id: 2, name_value: "a.test\nb.test".into(), not_after: None },
            CrtShEntry { id: 3, name_value: "c.test".into(), not_after: None },
        ];
        let deduped = dedup_by_name_value(&entries);
        assert_eq!(deduped.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
