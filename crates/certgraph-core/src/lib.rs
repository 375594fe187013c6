//! Fingerprint, domain/cert nodes and the bipartite [`CertGraph`] store.
//!
//! This crate holds no I/O and no concurrency beyond the single lock that
//! guards [`CertGraph`]; it is the shared vocabulary that the source and
//! engine crates build on.

mod cert;
mod domain;
mod error;
mod fingerprint;
mod graph;
mod status;
mod suffix;

pub use cert::CertNode;
pub use domain::DomainNode;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, FingerprintParseError};
pub use graph::{CertGraph, GraphMap};
pub use status::Status;
pub use suffix::{registrable_parent, strip_wildcard};
