//! Turns raw user strings into normalized hostnames, with optional
//! registrable-parent (TLD+1) expansion.

use certgraph_core::registrable_parent;
use url::Url;

/// Strip a trailing dot, try to parse as a URL and take its host, otherwise
/// keep the string as-is; lowercase the result.
pub fn normalize_seed(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('.');

    let host = match Url::parse(trimmed) {
        Ok(url) => url.host_str().map(|h| h.to_string()),
        Err(_) => None,
    };

    host.unwrap_or_else(|| trimmed.to_string()).to_lowercase()
}

/// `normalize_seed`, plus the registrable parent when `expand_tldplus1` is
/// set. TLD+1 extraction failures are silent: only the original is kept.
pub fn normalize_seeds(raw: &[String], expand_tldplus1: bool) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for r in raw {
        let host = normalize_seed(r);
        if seen.insert(host.clone()) {
            out.push(host.clone());
        }
        if expand_tldplus1 {
            if let Some(parent) = registrable_parent(&host) {
                if seen.insert(parent.clone()) {
                    out.push(parent);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_dot() {
        assert_eq!(normalize_seed("a.test."), "a.test");
    }

    #[test]
    fn parses_url_and_takes_host() {
        assert_eq!(normalize_seed("https://a.test:443/path"), "a.test");
    }

    #[test]
    fn bare_hostname_is_kept_as_is() {
        assert_eq!(normalize_seed("A.Test"), "a.test");
    }

    #[test]
    fn dedups_seed_list() {
        let seeds = vec!["a.test".to_string(), "a.test.".to_string()];
        assert_eq!(normalize_seeds(&seeds, false), vec!["a.test".to_string()]);
    }

    #[test]
    fn tldplus1_expansion_adds_registrable_parent() {
        let seeds = vec!["www.example.co.uk".to_string()];
        let out = normalize_seeds(&seeds, true);
        assert_eq!(out, vec!["www.example.co.uk".to_string(), "example.co.uk".to_string()]);
    }
}
