//! CT aggregator backend: a Google-style CT log index with pagination.
//!
//! Same shape as [`crate::crtsh::CrtShSource`] — JSON search, DER download
//! by id, local fingerprinting — but the wire format paginates with a
//! continuation token and caps results per page.

use crate::cache::DerCache;
use crate::error::{SourceError, SourceResult};
use crate::source::{CertResult, CertSource, QueryResult};
use crate::x509util::{extract_hostnames, looks_like_cdn_cert};
use async_trait::async_trait;
use certgraph_core::{Fingerprint, Status};
use serde::Deserialize;
use std::time::Duration;

pub const NAME: &str = "google";

/// Upper bound on certificates fetched per query, regardless of how many
/// pages the backend reports — keeps a single noisy domain from stalling
/// the worker pool.
const MAX_RESULTS_PER_QUERY: usize = 200;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    certificates: Vec<Entry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
}

pub struct GoogleCtSource {
    client: reqwest::Client,
    base_url: String,
    include_subdomains: bool,
    include_expired: bool,
    cache: DerCache,
}

impl GoogleCtSource {
    pub fn new(timeout: Duration, include_subdomains: bool, include_expired: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            client,
            base_url: "https://ct.googleapis.com/aggregate/v1/certs".to_string(),
            include_subdomains,
            include_expired,
            cache: DerCache::new(),
        }
    }

    fn search_pattern(&self, host: &str) -> String {
        if self.include_subdomains {
            format!("*.{host}")
        } else {
            host.to_string()
        }
    }

    async fn fetch_page(&self, domain: &str, page_token: Option<&str>) -> SourceResult<Page> {
        let mut query = vec![("domain", domain.to_string())];
        if self.include_expired {
            query.push(("include_expired", "true".to_string()));
        }
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::HttpStatus {
                status: resp.status().as_u16(),
                url: self.base_url.clone(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn download_der(&self, id: &str) -> SourceResult<Vec<u8>> {
        let url = format!("{}/download?id={}", self.base_url, id);
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
impl CertSource for GoogleCtSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn query(&self, host: &str) -> SourceResult<QueryResult> {
        let pattern = self.search_pattern(host);
        let mut ids = Vec::new();
        let mut page_token = None;

        loop {
            let page = self.fetch_page(&pattern, page_token.as_deref()).await?;
            ids.extend(page.certificates.into_iter().map(|e| e.id));
            if ids.len() >= MAX_RESULTS_PER_QUERY {
                ids.truncate(MAX_RESULTS_PER_QUERY);
                break;
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        if ids.is_empty() {
            return Ok(QueryResult::new().with_status(host, Status::Unknown));
        }

        let mut fingerprints = Vec::new();
        for id in ids {
            match self.download_der(&id).await {
                Ok(der) => {
                    let fingerprint = Fingerprint::from_der(&der);
                    self.cache.insert(fingerprint, der);
                    fingerprints.push(fingerprint);
                }
                Err(_) => continue,
            }
        }

        Ok(QueryResult::new()
            .with_status(host, Status::Good)
            .with_fingerprints(host, fingerprints))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_widens_for_subdomains() {
        let source = GoogleCtSource::new(Duration::from_secs(5), true, false);
        assert_eq!(source.search_pattern("example.com"), "*.example.com");
    }

    #[test]
    fn name_is_google() {
        let source = GoogleCtSource::new(Duration::from_secs(5), false, false);
        assert_eq!(source.name(), "google");
    }
}
