//! Render and export errors.

use layerpaint_core::CanvasError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Drawing surface unavailable for {width}x{height}")]
    SurfaceUnavailable { width: u32, height: u32 },
    #[error("Document has no layers")]
    EmptyLayerList,
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

impl From<png::EncodingError> for RenderError {
    fn from(e: png::EncodingError) -> Self {
        RenderError::Encode(e.to_string())
    }
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
