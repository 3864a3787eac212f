//! # Error Types
//!
//! This module defines error types used throughout the etiquetador library.

use thiserror::Error;

/// Main error type for etiquetador operations
#[derive(Debug, Error)]
pub enum EtiquetadorError {
    /// CSV manifest could not be read or parsed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Uploaded QR asset could not be decoded
    #[error("Asset error: {0}")]
    Asset(String),

    /// Template configuration or base image problem
    #[error("Template error: {0}")]
    Template(String),

    /// Per-item rendering failure (missing QR source, compositing problem)
    #[error("Render error: {0}")]
    Render(String),

    /// Output encoding failure (PNG, PDF, ZIP)
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, EtiquetadorError>;
