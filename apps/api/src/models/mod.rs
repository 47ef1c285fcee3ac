pub mod assessment;
pub mod career;
pub mod roadmap;
pub mod user;

use thiserror::Error;

/// Raised when a stored or submitted string names no known enum variant.
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
