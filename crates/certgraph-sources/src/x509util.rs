//! Shared DER -> (CN + SAN hostnames) extraction, used by every backend that
//! ends up holding a raw certificate (direct handshakes and CT aggregators
//! that serve back full DER/PEM blobs).

use crate::error::SourceError;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::{FromDer, X509Certificate};

/// Extract the lowercase CN (if present) plus every DNS SAN from a DER cert.
/// Order: CN first (if any), then SANs in certificate order. Not deduplicated
/// here — `CertNode::new` handles dedup/lowercasing.
pub fn extract_hostnames(der: &[u8]) -> Result<Vec<String>, SourceError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| SourceError::CertParse(e.to_string()))?;

    let mut hostnames = Vec::new();

    if let Some(cn) = cert.subject().iter_common_name().next() {
        if let Ok(cn) = cn.as_str() {
            hostnames.push(cn.to_string());
        }
    }

    if let Ok(Some(ext)) = cert.subject_alternative_name() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                if let GeneralName::DNSName(dns) = name {
                    hostnames.push(dns.to_string());
                }
            }
        }
    }

    Ok(hostnames)
}

/// Very small CDN-issuer heuristic: known CDN issuer CNs/orgs. A cert is
/// flagged `cdn_cert` when its issuer commonly fronts many unrelated
/// domains, which would otherwise pollute the graph with false kinship.
pub fn looks_like_cdn_cert(der: &[u8]) -> bool {
    const CDN_ISSUER_MARKERS: &[&str] = &["Cloudflare", "Fastly", "Akamai", "cPanel"];

    let Ok((_, cert)) = X509Certificate::from_der(der) else {
        return false;
    };
    let issuer = cert.issuer().to_string();
    CDN_ISSUER_MARKERS.iter().any(|marker| issuer.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed_cert(sans: &[&str]) -> Vec<u8> {
        let mut params = rcgen::CertificateParams::new(sans.iter().map(|s| s.to_string()).collect())
            .unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, sans[0]);
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        cert.der().to_vec()
    }

    #[test]
    fn extracts_cn_and_sans() {
        let der = self_signed_cert(&["a.test", "b.test"]);
        let hostnames = extract_hostnames(&der).unwrap();
        assert!(hostnames.iter().any(|h| h == "a.test"));
        assert!(hostnames.iter().any(|h| h == "b.test"));
    }

    #[test]
    fn self_signed_is_not_flagged_cdn() {
        let der = self_signed_cert(&["a.test"]);
        assert!(!looks_like_cdn_cert(&der));
    }
}
