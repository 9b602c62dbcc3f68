//! Error handling for Printlab.
//!
//! Provides error types for the two layers of the core:
//! - Document errors (scene graph mutation and unit validation)
//! - Export errors (packing and rasterization/vectorization)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Document error type
///
/// Represents errors raised by the scene graph mutation API, the unit
/// system, and the history engine. Validation and reference errors are
/// reported synchronously; the document is never left partially mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// A physical dimension or resolution is non-finite or non-positive
    #[error("Invalid dimension: {what} = {value}")]
    InvalidDimension {
        /// What was being validated (e.g. "dpi", "widthMm").
        what: &'static str,
        /// The offending value.
        value: f64,
    },

    /// No layer with the given identifier exists in the document
    #[error("Layer not found: {id}")]
    LayerNotFound {
        /// The identifier that failed to resolve.
        id: String,
    },

    /// Grouping requires at least two sibling layers
    #[error("Invalid group selection: {count} layer(s), need at least 2")]
    InvalidGroupSelection {
        /// How many layers were selected.
        count: usize,
    },

    /// The selected layers do not share a parent
    #[error("Invalid group selection: layers are not siblings")]
    NotSiblings,

    /// A mutation was attempted from inside an observer notification
    #[error("Reentrant mutation: record() called during change notification")]
    ReentrantMutation,
}

/// Export error type
///
/// Represents errors raised by the sheet packing planner and the export
/// pipeline. Degraded assets are not errors; they surface as warnings on
/// the produced artifact instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// A computed output dimension is zero or negative
    #[error("Invalid export geometry: {width}x{height} pixels")]
    InvalidExportGeometry {
        /// The computed width in pixels.
        width: i64,
        /// The computed height in pixels.
        height: i64,
    },

    /// The output encoder rejected the buffer
    #[error("Encoding failed: {reason}")]
    EncodingFailed {
        /// Why encoding failed.
        reason: String,
    },

    /// A multi-page export was cancelled between pages
    #[error("Export cancelled after {pages_done} page(s)")]
    Cancelled {
        /// Pages fully rendered before cancellation.
        pages_done: usize,
    },
}

/// Main error type for Printlab
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Document error
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error (invalid input, never coerced)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Document(DocumentError::InvalidDimension { .. })
                | Error::Document(DocumentError::InvalidGroupSelection { .. })
                | Error::Document(DocumentError::NotSiblings)
                | Error::Export(ExportError::InvalidExportGeometry { .. })
        )
    }

    /// Check if this is a dangling layer reference
    pub fn is_layer_not_found(&self) -> bool {
        matches!(self, Error::Document(DocumentError::LayerNotFound { .. }))
    }

    /// Check if this is an export cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Export(ExportError::Cancelled { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
