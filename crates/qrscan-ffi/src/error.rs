//! Errors raised inside the bindings before they collapse to a null pointer.

use qrscan_core::{AcquireError, ScanError};
use thiserror::Error;

/// Everything that can make an entry point return null.
#[derive(Debug, Error)]
pub enum FfiError {
    /// A required pointer argument was null.
    #[error("Null argument: {0}")]
    NullArgument(&'static str),

    /// The path is not valid for this platform.
    #[error("Invalid path encoding")]
    InvalidPath,

    /// The image could not be obtained.
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    /// The scan itself failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// More results than a C `int` count can describe.
    #[error("Too many results to marshal: {0}")]
    TooManyResults(usize),
}
