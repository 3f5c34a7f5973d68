//! Drawable element definitions.

use crate::geometry::{offset_points, points_bounds};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Identifier of the layer an element belongs to.
pub type LayerId = String;

/// Whether a closed shape is filled or outlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawType {
    #[default]
    Fill,
    Stroke,
}

/// Font settings and content of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub size: f64,
    pub family: String,
    pub content: String,
}

impl TextSpec {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            size: 16.0,
            family: "sans-serif".to_string(),
            content: content.into(),
        }
    }
}

/// Kind of an element without its kind-specific payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Rectangle,
    Circle,
    Triangle,
    Text,
    Brush,
    Eraser,
}

impl ElementType {
    /// Freehand kinds are always stroked.
    pub fn is_freehand(&self) -> bool {
        matches!(self, ElementType::Brush | ElementType::Eraser)
    }
}

/// Kind-specific element data, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Circle,
    Triangle {
        #[serde(default)]
        inverted: bool,
    },
    Text {
        text: TextSpec,
    },
    Brush {
        #[serde(default)]
        path: Vec<Point>,
    },
    Eraser {
        #[serde(default)]
        path: Vec<Point>,
    },
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Rectangle => ElementType::Rectangle,
            ElementKind::Circle => ElementType::Circle,
            ElementKind::Triangle { .. } => ElementType::Triangle,
            ElementKind::Text { .. } => ElementType::Text,
            ElementKind::Brush { .. } => ElementType::Brush,
            ElementKind::Eraser { .. } => ElementType::Eraser,
        }
    }
}

/// A single drawable element of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    pub id: ElementId,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub draw_type: DrawType,
    pub layer_id: LayerId,
    /// UI selection flag. Never persisted.
    #[serde(skip)]
    pub focused: bool,
}

fn default_opacity() -> f64 {
    1.0
}

impl CanvasElement {
    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn is_eraser(&self) -> bool {
        matches!(self.kind, ElementKind::Eraser { .. })
    }

    /// Freehand path for brush and eraser elements.
    pub fn path(&self) -> Option<&[Point]> {
        match &self.kind {
            ElementKind::Brush { path } | ElementKind::Eraser { path } => Some(path),
            _ => None,
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut Vec<Point>> {
        match &mut self.kind {
            ElementKind::Brush { path } | ElementKind::Eraser { path } => Some(path),
            _ => None,
        }
    }

    /// Bounding box in document space. Freehand elements use their path when present.
    pub fn bounds(&self) -> Rect {
        if let Some(rect) = self.path().and_then(points_bounds) {
            return rect;
        }
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Translate the element, including any freehand path.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        if let Some(path) = self.path_mut() {
            offset_points(path, dx, dy);
        }
    }

    /// Move the element's origin to an absolute position.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.translate(x - self.x, y - self.y);
    }
}

/// Optional overrides for `create_element`. Unset fields take the store defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementProperties {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub draw_type: Option<DrawType>,
    pub path: Option<Vec<Point>>,
    pub inverted: Option<bool>,
    pub text: Option<TextSpec>,
}

impl ElementProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_stroke(mut self, stroke: impl Into<String>) -> Self {
        self.stroke = Some(stroke.into());
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_draw_type(mut self, draw_type: DrawType) -> Self {
        self.draw_type = Some(draw_type);
        self
    }

    pub fn with_path(mut self, path: Vec<Point>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = Some(inverted);
        self
    }

    pub fn with_text(mut self, text: TextSpec) -> Self {
        self.text = Some(text);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: ElementKind) -> CanvasElement {
        CanvasElement {
            id: Uuid::new_v4(),
            kind,
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            fill: "hsl(0, 0%, 0%)".to_string(),
            stroke: "hsl(0, 0%, 0%)".to_string(),
            stroke_width: 2.0,
            opacity: 1.0,
            draw_type: DrawType::Fill,
            layer_id: "layer".to_string(),
            focused: true,
        }
    }

    #[test]
    fn test_serialization_tags_kind_and_skips_focus() {
        let el = sample(ElementKind::Triangle { inverted: true });
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["type"], "triangle");
        assert_eq!(json["inverted"], true);
        assert_eq!(json["draw_type"], "fill");
        assert!(json.get("focused").is_none());

        let back: CanvasElement = serde_json::from_value(json).unwrap();
        assert!(!back.focused);
        assert_eq!(back.kind, el.kind);
        assert_eq!(back.id, el.id);
    }

    #[test]
    fn test_translate_moves_path() {
        let mut el = sample(ElementKind::Brush {
            path: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        });
        el.translate(10.0, -5.0);
        assert_eq!(el.x, 20.0);
        assert_eq!(el.y, 15.0);
        assert_eq!(el.path().unwrap()[1], Point::new(15.0, 0.0));
    }

    #[test]
    fn test_move_to_is_absolute() {
        let mut el = sample(ElementKind::Rectangle);
        el.move_to(1.0, 2.0);
        assert_eq!((el.x, el.y), (1.0, 2.0));
        assert_eq!(el.bounds(), Rect::new(1.0, 2.0, 31.0, 42.0));
    }

    #[test]
    fn test_bounds_prefers_path() {
        let el = sample(ElementKind::Eraser {
            path: vec![Point::new(100.0, 100.0), Point::new(110.0, 120.0)],
        });
        assert_eq!(el.bounds(), Rect::new(100.0, 100.0, 110.0, 120.0));
        assert!(el.is_eraser());
        assert!(el.element_type().is_freehand());
    }
}
