use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the whole parse (§7 "fatal" error classes).
///
/// Tolerated conditions (malformed records, unknown symbols, unreadable
/// per-layer files, truncated surfaces) never produce a value of this type —
/// they are logged at `debug` level and the parser substitutes a default and
/// continues.
#[derive(Debug, Error)]
pub enum OdbError {
    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(PathBuf),

    #[error("no ODB++ root found (no matrix/matrix within depth 2) under {0}")]
    RootNotFound(PathBuf),

    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("matrix/matrix is missing or unreadable at {0}")]
    MatrixMissing(PathBuf),

    #[error("model failed validation: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive extraction error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, OdbError>;
