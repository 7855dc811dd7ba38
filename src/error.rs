//! Error types for arenakv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ArenaError
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Unified error type for arenakv operations
#[derive(Debug, Error)]
pub enum ArenaError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Argument Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("Address space exhausted: {requested} bytes requested")]
    OutOfSpace { requested: usize },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Allocator is closed")]
    Closed,
}
