//! Shared error types for the fen toolchain's outer layers.
//!
//! Parse/runtime errors that are part of the language's own text
//! protocol are reported through [`crate::diagnostic`]
//! rather than `Result` — they're user output, not Rust-level failures.
//! This module covers genuine host-side failures: bad CLI input, I/O.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FencError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, FencError>;
