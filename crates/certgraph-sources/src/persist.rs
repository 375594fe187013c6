//! Atomic, idempotent persistence of DER certificates as PEM text.
//!
//! Grounded on the teacher's `linglide-server::tls::CertificateManager`,
//! which writes cert/key/metadata files and never tears down a partially
//! written file: here we generalize "write then rename" to a single PEM
//! file per fingerprint, shared across every [`crate::CertSource`] backend.

use certgraph_core::Fingerprint;
use std::io;
use std::path::{Path, PathBuf};

/// Armor `der` as PEM and write it to `<dir>/<FINGERPRINT>.pem`.
///
/// Writes to a temp file in the same directory and renames it into place so
/// concurrent workers never observe a partially written certificate.
/// Rewriting an existing file is a no-op.
pub async fn save_cert_pem(dir: &Path, fingerprint: &Fingerprint, der: &[u8]) -> io::Result<PathBuf> {
    let final_path = dir.join(format!("{fingerprint}.pem"));
    if tokio::fs::metadata(&final_path).await.is_ok() {
        return Ok(final_path);
    }

    let pem = der_to_pem(der);
    let tmp_path = dir.join(format!(".{fingerprint}.pem.tmp"));
    tokio::fs::write(&tmp_path, pem.as_bytes()).await?;
    tokio::fs::rename(&tmp_path, &final_path).await?;
    Ok(final_path)
}

fn der_to_pem(der: &[u8]) -> String {
    use std::fmt::Write;

    let encoded = base64_encode(der);
    let mut out = String::from("-----BEGIN CERTIFICATE-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        let _ = writeln!(out, "{}", std::str::from_utf8(chunk).unwrap());
    }
    out.push_str("-----END CERTIFICATE-----\n");
    out
}

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);

        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}
