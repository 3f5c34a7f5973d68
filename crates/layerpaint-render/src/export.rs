//! Offscreen export to PNG and per-layer thumbnails.

use crate::error::{RenderError, RenderResult};
use crate::renderer::{RenderContext, draw_canvas};
use crate::surface::{PngCompression, Surface};
use layerpaint_core::{Document, LayerId};
use std::future::Future;
use std::pin::Pin;
use tiny_skia::Color;

/// Boxed future returned by asynchronous encoding.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Configuration for PNG export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Overrides the document DPI when set.
    pub dpi: Option<u32>,
    /// Encoding quality in `[0, 1]`, mapped to PNG compression effort.
    pub quality: f64,
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dpi: None,
            quality: 0.92,
            background: [255, 255, 255, 255],
        }
    }
}

impl ExportConfig {
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_background(mut self, background: [u8; 4]) -> Self {
        self.background = background;
        self
    }

    fn background_color(&self) -> Color {
        let [r, g, b, a] = self.background;
        Color::from_rgba8(r, g, b, a)
    }
}

/// A fully drawn export surface waiting to be encoded.
///
/// The surface is owned by the job, so jobs never share pixels and later
/// document edits do not affect an already prepared export.
#[derive(Debug)]
pub struct ExportJob {
    surface: Surface,
    quality: f64,
}

impl ExportJob {
    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Encode to PNG. `quality` overrides the configured quality when given.
    pub fn encode(self, quality: Option<f64>) -> BoxFuture<'static, RenderResult<Vec<u8>>> {
        let compression = PngCompression::from_quality(quality.unwrap_or(self.quality));
        let surface = self.surface;
        Box::pin(async move {
            let png = surface.to_png(compression)?;
            log::info!(
                "Encoded {}x{} export: {} bytes",
                surface.width(),
                surface.height(),
                png.len()
            );
            Ok(png)
        })
    }
}

/// Draw the document onto a new surface of `(width × dpi, height × dpi)` pixels.
pub fn prepare_for_export(document: &Document, config: &ExportConfig) -> RenderResult<ExportJob> {
    if document.layers().is_empty() {
        return Err(RenderError::EmptyLayerList);
    }

    let viewport = document.viewport();
    let dpi = config.dpi.unwrap_or(viewport.dpi).max(1);
    let width = viewport.width.saturating_mul(dpi);
    let height = viewport.height.saturating_mul(dpi);

    let mut surface = Surface::new(width, height)?;
    surface.scale(dpi as f32, dpi as f32);

    let ctx = RenderContext::new(document)
        .with_dpi(dpi)
        .with_background(config.background_color());
    draw_canvas(&mut surface, &ctx);
    log::debug!("Prepared {}x{} export at {} dpi", width, height, dpi);

    Ok(ExportJob {
        surface,
        quality: config.quality,
    })
}

/// A persisted layer: metadata plus a PNG thumbnail of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    pub id: LayerId,
    pub name: String,
    pub image: Vec<u8>,
    pub position: usize,
}

/// Render each layer alone into a `thumb_width × thumb_height` PNG.
pub fn build_layer_records(
    document: &Document,
    thumb_width: u32,
    thumb_height: u32,
) -> RenderResult<Vec<LayerRecord>> {
    if document.layers().is_empty() {
        return Err(RenderError::EmptyLayerList);
    }
    let dpi = document.viewport().dpi as f32;

    document
        .layers()
        .iter()
        .enumerate()
        .map(|(position, layer)| {
            let mut surface = Surface::new(thumb_width, thumb_height)?;
            surface.scale(dpi, dpi);
            let ctx = RenderContext::new(document).with_layer(&layer.id);
            draw_canvas(&mut surface, &ctx);
            Ok(LayerRecord {
                id: layer.id.clone(),
                name: layer.name.clone(),
                image: surface.to_png(PngCompression::Fast)?,
                position,
            })
        })
        .collect()
}
