//! LayerPaint Render Library
//!
//! Deterministic CPU rasterization of LayerPaint documents onto tiny-skia
//! surfaces, for live display, layer thumbnails and PNG export.

mod error;
mod export;
mod renderer;
mod surface;

pub use error::{RenderError, RenderResult};
pub use export::{BoxFuture, ExportConfig, ExportJob, LayerRecord, build_layer_records, prepare_for_export};
pub use renderer::{CanvasRenderer, RenderContext, Renderer, draw_canvas};
pub use surface::{CompositeOp, MAX_DIMENSION, PngCompression, Surface, parse_css_color};
