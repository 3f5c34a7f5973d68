//! Viewport state: document size, pan/zoom, export DPI and the active tool settings.

use crate::color::{is_valid_hsl, with_alpha};
use crate::element::{DrawType, ElementType};
use crate::error::{CanvasError, CanvasResult};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 3.0;
pub const SCALE_STEP: f64 = 0.1;
pub const MIN_DPI: u32 = 1;
pub const MAX_DPI: u32 = 8;

/// Current interaction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    Select,
    Pan,
    Shape,
    Brush,
    Eraser,
    Text,
}

/// Shape drawn by the shape tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
}

impl From<ShapeKind> for ElementType {
    fn from(shape: ShapeKind) -> Self {
        match shape {
            ShapeKind::Rectangle => ElementType::Rectangle,
            ShapeKind::Circle => ElementType::Circle,
            ShapeKind::Triangle => ElementType::Triangle,
        }
    }
}

/// Document dimensions plus the pan/zoom view onto them.
///
/// `position` is the pan offset in screen pixels and `scale` the zoom factor;
/// together they map document space to screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub dpi: u32,
    pub position: Vec2,
    pub color: String,
    pub mode: ToolMode,
    pub shape: ShapeKind,
    pub shape_mode: DrawType,
    pub stroke_width: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            scale: 1.0,
            dpi: 1,
            position: Vec2::ZERO,
            color: "hsla(0, 0%, 0%, 1)".to_string(),
            mode: ToolMode::default(),
            shape: ShapeKind::default(),
            shape_mode: DrawType::Fill,
            stroke_width: 2.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.position) * Affine::scale(self.scale)
    }

    /// Screen-to-document transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.position)
    }

    pub fn screen_to_document(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn document_to_screen(&self, document_point: Point) -> Point {
        self.transform() * document_point
    }

    /// Pixel size of an export surface.
    pub fn export_size(&self) -> (u32, u32) {
        (
            self.width.saturating_mul(self.dpi),
            self.height.saturating_mul(self.dpi),
        )
    }

    pub fn change_dimensions(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Invalid document size {}x{}, clamping to 1", width, height);
        }
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn change_color(&mut self, color: &str) -> CanvasResult<()> {
        if !is_valid_hsl(color) {
            return Err(CanvasError::InvalidColor(color.to_string()));
        }
        self.color = color.to_string();
        Ok(())
    }

    pub fn change_color_alpha(&mut self, alpha: f64) -> CanvasResult<()> {
        self.color = with_alpha(&self.color, alpha)?;
        Ok(())
    }

    pub fn change_mode(&mut self, mode: ToolMode) {
        self.mode = mode;
    }

    pub fn change_shape(&mut self, shape: ShapeKind) {
        self.shape = shape;
    }

    pub fn change_shape_mode(&mut self, shape_mode: DrawType) {
        self.shape_mode = shape_mode;
    }

    pub fn change_stroke_width(&mut self, width: f64) {
        if !(width.is_finite() && width >= 1.0) {
            log::warn!("Invalid stroke width {}, clamping to 1", width);
            self.stroke_width = if width.is_finite() { width.max(1.0) } else { 1.0 };
            return;
        }
        self.stroke_width = width;
    }

    pub fn change_dpi(&mut self, dpi: u32) {
        let clamped = dpi.clamp(MIN_DPI, MAX_DPI);
        if clamped != dpi {
            log::warn!("DPI {} out of range, clamping to {}", dpi, clamped);
        }
        self.dpi = clamped;
    }

    pub fn increase_scale(&mut self) {
        self.scale = step_scale(self.scale, SCALE_STEP);
    }

    pub fn decrease_scale(&mut self) {
        self.scale = step_scale(self.scale, -SCALE_STEP);
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = Vec2::new(x, y);
    }

    pub fn change_x(&mut self, dx: f64) {
        self.position.x += dx;
    }

    pub fn change_y(&mut self, dy: f64) {
        self.position.y += dy;
    }
}

// Rounded to one decimal so repeated steps do not drift.
fn step_scale(scale: f64, delta: f64) -> f64 {
    let next = ((scale + delta) * 10.0).round() / 10.0;
    next.clamp(MIN_SCALE, MAX_SCALE)
}
