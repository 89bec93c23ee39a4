//! Error types for the map viewer core.

use thiserror::Error;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type for registry and style-compilation operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    // === Configuration errors (fatal to the call, never defaulted) ===
    #[error("Unknown colormap: {0}")]
    UnknownColorMap(String),

    #[error("Layer kind '{0}' has no compiled style")]
    UnsupportedLayerKind(String),

    #[error("Symbology does not match layer kind '{kind}': expected {expected}")]
    SymbologyMismatch { kind: String, expected: String },

    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    // === Registry errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer already registered: {0}")]
    DuplicateLayer(String),

    #[error("Workspace is full: maximum of {max} layers reached")]
    WorkspaceFull { max: usize },

    #[error("Field '{field}' not found on layer {layer}")]
    FieldNotFound { layer: String, field: String },

    #[error("Reorder sequence is not a permutation of the current layers")]
    InvalidOrder,

    // === Input errors ===
    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),
}
