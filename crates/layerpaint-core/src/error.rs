//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Precondition violations raised by the document stores.
///
/// Soft validation problems (sizes below the minimum, out-of-range opacity or
/// scale) are clamped and logged instead of surfacing here.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("No active layer to receive new elements")]
    NoActiveLayer,
    #[error("The layer list is empty")]
    EmptyLayerList,
    #[error("Text elements require text properties")]
    MissingTextProperties,
    #[error("Invalid HSL/HSLA color: {0}")]
    InvalidColor(String),
    #[error("Layer not found: {0}")]
    LayerNotFound(String),
    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Malformed history action: {0}")]
    MalformedAction(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
