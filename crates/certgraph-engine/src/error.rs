//! Fatal pre-flight failures. Once a traversal has started, the engine
//! cannot fail — per-domain and per-cert failures are absorbed and logged at
//! the worker boundary instead (see `certgraph_sources::SourceError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no seed hosts supplied")]
    NoSeeds,

    #[error("parallelism must be >= 1, got {0}")]
    InvalidParallelism(i64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
