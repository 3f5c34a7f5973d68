//! The rendering pipeline: paints a document onto a [`Surface`].

use crate::surface::{CompositeOp, Surface, parse_css_color};
use layerpaint_core::{CanvasElement, Document, DrawType, ElementKind};
use std::collections::HashMap;
use tiny_skia::{Color, LineCap, LineJoin};

/// Length of the segment drawn for a single-point freehand stroke.
const DOT_LENGTH: f32 = 0.1;

/// Inputs of a single render pass.
pub struct RenderContext<'a> {
    /// The document to render.
    pub document: &'a Document,
    /// Render only this layer's elements (thumbnails). Visibility is ignored.
    pub layer_id: Option<&'a str>,
    /// Background painted behind all elements.
    pub background_color: Color,
    /// Export DPI the surface was sized for.
    pub dpi: u32,
}

impl<'a> RenderContext<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            layer_id: None,
            background_color: Color::WHITE,
            dpi: document.viewport().dpi,
        }
    }

    /// Restrict the pass to a single layer.
    pub fn with_layer(mut self, layer_id: &'a str) -> Self {
        self.layer_id = Some(layer_id);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Elements painted by this pass, back to front.
    ///
    /// Layers paint in list order; elements keep document order within a layer.
    /// Elements on hidden or missing layers are skipped unless a layer is selected.
    pub fn visible_elements(&self) -> Vec<&'a CanvasElement> {
        let document = self.document;
        if let Some(layer_id) = self.layer_id {
            return document
                .elements()
                .iter()
                .filter(|e| e.layer_id == layer_id)
                .collect();
        }

        let layers: HashMap<&str, (usize, bool)> = document
            .layers()
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id.as_str(), (i, l.hidden)))
            .collect();
        let mut visible: Vec<(usize, &'a CanvasElement)> = document
            .elements()
            .iter()
            .filter_map(|e| match layers.get(e.layer_id.as_str()) {
                Some(&(position, false)) => Some((position, e)),
                _ => None,
            })
            .collect();
        visible.sort_by_key(|(position, _)| *position);
        visible.into_iter().map(|(_, e)| e).collect()
    }
}

/// A rendering backend.
pub trait Renderer {
    /// Paint a full frame onto `surface`.
    fn render(&mut self, surface: &mut Surface, ctx: &RenderContext);

    /// Get the background color.
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

/// CPU renderer over tiny-skia surfaces.
#[derive(Debug, Default)]
pub struct CanvasRenderer;

impl CanvasRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for CanvasRenderer {
    fn render(&mut self, surface: &mut Surface, ctx: &RenderContext) {
        draw_canvas(surface, ctx);
    }
}

/// Repaint `surface` from scratch.
///
/// A surface narrower than the document at its export DPI is drawn in preview
/// mode: uniformly downscaled so the whole document width fits.
pub fn draw_canvas(surface: &mut Surface, ctx: &RenderContext) {
    let viewport = ctx.document.viewport();
    let elements = ctx.visible_elements();

    surface.clear();

    let full_width = f64::from(viewport.width) * f64::from(ctx.dpi);
    let preview = f64::from(surface.width()) < full_width;
    if preview {
        let scale = (f64::from(surface.width()) / full_width) as f32;
        surface.save();
        surface.scale(scale, scale);
    }

    for element in elements {
        draw_element(surface, element);
    }

    surface.save();
    surface.reset_transform();
    surface.set_global_alpha(1.0);
    surface.set_composite(CompositeOp::DestinationOver);
    surface.set_fill_color(ctx.background_color);
    surface.fill_rect(0.0, 0.0, surface.width() as f32, surface.height() as f32);
    surface.restore();

    if preview {
        surface.restore();
    }
}

fn draw_element(surface: &mut Surface, element: &CanvasElement) {
    surface.set_fill_color(element_color(&element.fill, element));
    surface.set_stroke_color(element_color(&element.stroke, element));
    surface.set_line_width(element.stroke_width as f32);
    surface.set_global_alpha(element.opacity as f32);
    surface.set_composite(if element.is_eraser() {
        CompositeOp::DestinationOut
    } else {
        CompositeOp::SourceOver
    });

    let (x, y) = (element.x as f32, element.y as f32);
    let (w, h) = (element.width as f32, element.height as f32);

    match &element.kind {
        ElementKind::Brush { path } | ElementKind::Eraser { path } => {
            let Some((first, rest)) = path.split_first() else {
                return;
            };
            surface.set_line_cap(LineCap::Round);
            surface.set_line_join(LineJoin::Round);
            surface.begin_path();
            surface.move_to(first.x as f32, first.y as f32);
            if rest.is_empty() {
                surface.line_to(first.x as f32 + DOT_LENGTH, first.y as f32);
            }
            for p in rest {
                surface.line_to(p.x as f32, p.y as f32);
            }
            surface.stroke();
        }
        ElementKind::Circle => {
            surface.begin_path();
            surface.ellipse(x + w / 2.0, y + h / 2.0, w / 2.0, h / 2.0);
            paint_path(surface, element.draw_type);
        }
        ElementKind::Rectangle => match element.draw_type {
            DrawType::Fill => surface.fill_rect(x, y, w, h),
            DrawType::Stroke => surface.stroke_rect(x, y, w, h),
        },
        ElementKind::Triangle { inverted } => {
            let (apex_y, base_y) = if *inverted { (y + h, y) } else { (y, y + h) };
            surface.set_line_join(LineJoin::Miter);
            surface.begin_path();
            surface.move_to(x + w / 2.0, apex_y);
            surface.line_to(x + w, base_y);
            surface.line_to(x, base_y);
            surface.close_path();
            paint_path(surface, element.draw_type);
        }
        ElementKind::Text { .. } => {
            log::trace!("Skipping text element {}", element.id);
        }
    }
}

fn paint_path(surface: &mut Surface, draw_type: DrawType) {
    match draw_type {
        DrawType::Fill => surface.fill(),
        DrawType::Stroke => surface.stroke(),
    }
}

fn element_color(value: &str, element: &CanvasElement) -> Color {
    parse_css_color(value).unwrap_or_else(|| {
        log::warn!(
            "Element {} has invalid color {:?}, using black",
            element.id,
            value
        );
        Color::BLACK
    })
}
