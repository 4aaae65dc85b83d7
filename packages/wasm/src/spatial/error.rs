//! Error types for the spatial index.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("expected 0 or 4 window bounds, got {given}")]
    ArgumentCount { given: usize },
}
