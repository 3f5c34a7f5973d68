//! LayerPaint Core Library
//!
//! Document model for a layered drawing surface: elements, layers, viewport
//! state, command-style undo/redo and persistence snapshots.

pub mod color;
pub mod document;
pub mod element;
pub mod element_store;
pub mod error;
pub mod geometry;
pub mod history;
pub mod layer;
pub mod signal;
pub mod viewport;

pub use color::{HslColor, is_valid_hsl, with_alpha};
pub use document::{Document, DocumentConfig, SavedDocument};
pub use element::{
    CanvasElement, DrawType, ElementId, ElementKind, ElementProperties, ElementType, LayerId,
    TextSpec,
};
pub use element_store::{ElementDefaults, ElementStore};
pub use error::{CanvasError, CanvasResult};
pub use geometry::{get_canvas_pointer_position, swap_elements};
pub use history::{History, HistoryAction, RemovedElement};
pub use layer::{Layer, LayerStore};
pub use signal::{RedrawEvent, RedrawSignal};
pub use viewport::{ShapeKind, ToolMode, Viewport};
