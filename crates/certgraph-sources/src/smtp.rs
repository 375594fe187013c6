//! Direct SMTP backend: connect `host:25`, issue `STARTTLS`, handshake, and
//! additionally report MX hostnames via `Related()`.

use crate::cache::DerCache;
use crate::error::{SourceError, SourceResult};
use crate::source::{CertResult, CertSource, QueryResult};
use crate::tls_dial::{connect_tcp, handshake};
use crate::x509util::{extract_hostnames, looks_like_cdn_cert};
use async_trait::async_trait;
use certgraph_core::{Fingerprint, Status};
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const NAME: &str = "smtp";

pub struct SmtpSource {
    timeout: Duration,
    cache: DerCache,
}

impl SmtpSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cache: DerCache::new(),
        }
    }

    async fn mx_hosts(&self, domain: &str) -> Vec<String> {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        match resolver.mx_lookup(domain).await {
            Ok(lookup) => lookup
                .iter()
                .map(|mx| mx.exchange().to_string().trim_end_matches('.').to_lowercase())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn starttls_handshake(&self, host: &str) -> SourceResult<Vec<Vec<u8>>> {
        let tcp = connect_tcp(host, 25, self.timeout).await?;
        let mut buffered = BufReader::new(tcp);

        // Read the 220 greeting.
        read_line(&mut buffered, host).await?;

        write_line(&mut buffered, "EHLO certgraph.local").await?;
        read_ehlo_response(&mut buffered, host).await?;

        write_line(&mut buffered, "STARTTLS").await?;
        let reply = read_line(&mut buffered, host).await?;
        if !reply.starts_with("220") {
            return Err(SourceError::Protocol {
                host: host.to_string(),
                message: format!("STARTTLS refused: {reply}"),
            });
        }

        let tcp = buffered.into_inner();
        let (_stream, chain) = handshake(host, tcp, self.timeout).await?;
        Ok(chain)
    }
}

async fn write_line(buffered: &mut BufReader<tokio::net::TcpStream>, line: &str) -> SourceResult<()> {
    buffered
        .write_all(format!("{line}\r\n").as_bytes())
        .await
        .map_err(|e| SourceError::Protocol {
            host: String::new(),
            message: e.to_string(),
        })
}

async fn read_line(buffered: &mut BufReader<tokio::net::TcpStream>, host: &str) -> SourceResult<String> {
    let mut line = String::new();
    buffered
        .read_line(&mut line)
        .await
        .map_err(|_| SourceError::Protocol {
            host: host.to_string(),
            message: "connection closed before a complete reply".to_string(),
        })?;
    Ok(line)
}

async fn read_ehlo_response(buffered: &mut BufReader<tokio::net::TcpStream>, host: &str) -> SourceResult<()> {
    // Multi-line EHLO replies use "250-" for all but the last line ("250 ").
    loop {
        let line = read_line(buffered, host).await?;
        if line.starts_with("250 ") || line.len() < 4 {
            return Ok(());
        }
        if !line.starts_with("250-") {
            return Err(SourceError::Protocol {
                host: host.to_string(),
                message: format!("unexpected EHLO reply: {line}"),
            });
        }
    }
}

#[async_trait]
impl CertSource for SmtpSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn query(&self, host: &str) -> SourceResult<QueryResult> {
        let outcome = self.starttls_handshake(host).await;

        let (status, chain) = match outcome {
            Ok(chain) if chain.is_empty() => (Status::Unknown, Vec::new()),
            Ok(chain) => (Status::Good, chain),
            Err(SourceError::Timeout { .. }) => (Status::Timeout, Vec::new()),
            Err(SourceError::Connect { .. }) => (Status::Refused, Vec::new()),
            Err(SourceError::Protocol { .. }) => (Status::NoHost, Vec::new()),
            Err(other) => return Err(other),
        };

        let mut result = QueryResult::new()
            .with_status(host, status)
            .with_related(self.mx_hosts(host).await);

        if let Some(leaf_der) = chain.into_iter().next() {
            let fingerprint = Fingerprint::from_der(&leaf_der);
            self.cache.insert(fingerprint, leaf_der);
            result = result.with_fingerprints(host, vec![fingerprint]);
        }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_smtp() {
        let source = SmtpSource::new(Duration::from_secs(1));
        assert_eq!(source.name(), "smtp");
    }
}
