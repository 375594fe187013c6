//! Error types for the graph core.

use thiserror::Error;

/// Errors the graph layer itself can produce. The graph performs no I/O, so
/// this is intentionally small — it exists for symmetry with the other
/// crates' per-crate `Error`/`Result` pattern and as a conversion target for
/// callers that want a single error type at the top of the call stack.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed wildcard SAN: {0}")]
    MalformedWildcard(String),
}

pub type Result<T> = std::result::Result<T, Error>;
