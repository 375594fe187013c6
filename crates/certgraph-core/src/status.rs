//! Source-observed probe status for a domain.

use serde::{Deserialize, Serialize};

/// What a [`crate::CertSource`]-like backend observed when probing a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Good,
    Timeout,
    Refused,
    Revoked,
    Expired,
    NoHost,
    Unknown,
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown
    }
}
