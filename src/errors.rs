//! Error types for PRG construction and coverage-graph/FM-index loading.
//!
//! Mapping-time and genotyping-time edge cases are deliberately *not* modelled
//! here: per the error-handling design, a bad read is counted and logged, and
//! a numerically degenerate site resolves to a null call. Only build-time and
//! load-time conditions are fatal, so only those get a `GramError` variant.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GramError {
    #[error("malformed PRG at position {position}: {reason}")]
    MalformedPrg { position: usize, reason: String },

    #[error(
        "coverage graph and FM-index disagree on PRG length: expected {expected}, found {found}"
    )]
    IndexGraphMismatch { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize graph data: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GramError>;
