//! Bitmap drawing surface with a 2D-context style API over tiny-skia.
//!
//! Pixels are stored premultiplied; every read-out (`pixel`, `image_data`,
//! `to_png`) converts back to straight alpha.

use crate::error::{RenderError, RenderResult};
use tiny_skia::{
    BlendMode, Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke,
    Transform,
};

/// Largest surface edge in pixels.
pub const MAX_DIMENSION: u32 = 32767;

/// Pixel blending rule for subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    #[default]
    SourceOver,
    /// Punch out existing pixels (eraser).
    DestinationOut,
    /// Paint only behind existing pixels (background).
    DestinationOver,
}

impl From<CompositeOp> for BlendMode {
    fn from(op: CompositeOp) -> Self {
        match op {
            CompositeOp::SourceOver => BlendMode::SourceOver,
            CompositeOp::DestinationOut => BlendMode::DestinationOut,
            CompositeOp::DestinationOver => BlendMode::DestinationOver,
        }
    }
}

/// PNG compression effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl PngCompression {
    /// Map a `[0, 1]` quality to a compression level.
    pub fn from_quality(quality: f64) -> Self {
        if !quality.is_finite() {
            return PngCompression::Default;
        }
        match quality.clamp(0.0, 1.0) {
            q if q < 0.34 => PngCompression::Fast,
            q if q < 0.67 => PngCompression::Default,
            _ => PngCompression::Best,
        }
    }
}

impl From<PngCompression> for png::Compression {
    fn from(c: PngCompression) -> Self {
        match c {
            PngCompression::Fast => png::Compression::Fast,
            PngCompression::Default => png::Compression::Default,
            PngCompression::Best => png::Compression::Best,
        }
    }
}

/// Drawing state saved and restored by `save`/`restore`.
#[derive(Debug, Clone)]
struct DrawingState {
    fill: Color,
    stroke: Color,
    line_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    global_alpha: f32,
    composite: CompositeOp,
    transform: Transform,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            global_alpha: 1.0,
            composite: CompositeOp::SourceOver,
            transform: Transform::identity(),
        }
    }
}

pub struct Surface {
    pixmap: Pixmap,
    state: DrawingState,
    state_stack: Vec<DrawingState>,
    path_builder: PathBuilder,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("depth", &self.state_stack.len())
            .finish()
    }
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::SurfaceUnavailable { width, height });
        }
        let pixmap =
            Pixmap::new(width, height).ok_or(RenderError::SurfaceUnavailable { width, height })?;

        Ok(Self {
            pixmap,
            state: DrawingState::default(),
            state_stack: Vec::new(),
            path_builder: PathBuilder::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn save(&mut self) {
        self.state_stack.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    // --- Style ---

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn set_composite(&mut self, op: CompositeOp) {
        self.state.composite = op;
    }

    pub fn composite(&self) -> CompositeOp {
        self.state.composite
    }

    // --- Transform ---

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_scale(x, y);
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::identity();
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    // --- Paths ---

    pub fn begin_path(&mut self) {
        self.path_builder = PathBuilder::new();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.path_builder.move_to(x, y);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.path_builder.line_to(x, y);
    }

    pub fn close_path(&mut self) {
        self.path_builder.close();
    }

    /// Add an axis-aligned ellipse centered at `(cx, cy)`.
    pub fn ellipse(&mut self, cx: f32, cy: f32, radius_x: f32, radius_y: f32) {
        if let Some(oval) =
            Rect::from_xywh(cx - radius_x, cy - radius_y, radius_x * 2.0, radius_y * 2.0)
        {
            self.path_builder.push_oval(oval);
        }
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            self.path_builder.push_rect(rect);
        }
    }

    /// Fill the current path and start a new one.
    pub fn fill(&mut self) {
        let path = std::mem::replace(&mut self.path_builder, PathBuilder::new()).finish();
        if let Some(path) = path {
            let paint = self.paint(self.state.fill);
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, self.state.transform, None);
        }
    }

    /// Stroke the current path and start a new one.
    pub fn stroke(&mut self) {
        let path = std::mem::replace(&mut self.path_builder, PathBuilder::new()).finish();
        if let Some(path) = path {
            let paint = self.paint(self.state.stroke);
            let stroke = Stroke {
                width: self.state.line_width,
                line_cap: self.state.line_cap,
                line_join: self.state.line_join,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, self.state.transform, None);
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            let paint = self.paint(self.state.fill);
            self.pixmap.fill_rect(rect, &paint, self.state.transform, None);
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.begin_path();
        self.rect(x, y, width, height);
        self.stroke();
    }

    /// Clear every pixel regardless of the current transform.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    // --- Output ---

    /// Straight-alpha RGBA of one pixel, or None when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Straight-alpha RGBA bytes of the whole surface, row-major.
    pub fn image_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        data
    }

    pub fn to_png(&self, compression: PngCompression) -> RenderResult<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width(), self.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(compression.into());

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.image_data())?;
        }
        Ok(buf)
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut color = color;
        if self.state.global_alpha < 1.0 {
            color.set_alpha((color.alpha() * self.state.global_alpha).clamp(0.0, 1.0));
        }
        let mut paint = Paint {
            anti_alias: true,
            blend_mode: self.state.composite.into(),
            ..Default::default()
        };
        paint.set_color(color);
        paint
    }
}

/// Parse a CSS color string (hex, named, rgb(), hsl(), hsla()).
pub fn parse_css_color(s: &str) -> Option<Color> {
    let [r, g, b, a] = csscolorparser::parse(s).ok()?.to_rgba8();
    Some(Color::from_rgba8(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Surface::new(0, 10),
            Err(RenderError::SurfaceUnavailable { width: 0, height: 10 })
        ));
        assert!(Surface::new(MAX_DIMENSION + 1, 1).is_err());
    }

    #[test]
    fn test_fill_rect_straight_alpha() {
        let mut s = Surface::new(10, 10).unwrap();
        s.set_fill_color(Color::from_rgba8(255, 0, 0, 255));
        s.set_global_alpha(0.5);
        s.fill_rect(0.0, 0.0, 10.0, 10.0);
        let [r, g, _, a] = s.pixel(5, 5).unwrap();
        assert!(r >= 254);
        assert_eq!(g, 0);
        assert!((126..=129).contains(&a));
        assert!(s.pixel(10, 0).is_none());
    }

    #[test]
    fn test_save_restore_transform() {
        let mut s = Surface::new(20, 20).unwrap();
        s.save();
        s.scale(2.0, 2.0);
        s.set_composite(CompositeOp::DestinationOut);
        s.restore();
        assert_eq!(s.transform(), Transform::identity());
        assert_eq!(s.composite(), CompositeOp::SourceOver);
    }

    #[test]
    fn test_destination_out_erases() {
        let mut s = Surface::new(10, 10).unwrap();
        s.fill_rect(0.0, 0.0, 10.0, 10.0);
        s.set_composite(CompositeOp::DestinationOut);
        s.fill_rect(0.0, 0.0, 5.0, 10.0);
        assert_eq!(s.pixel(2, 5).unwrap()[3], 0);
        assert_eq!(s.pixel(7, 5).unwrap()[3], 255);
    }

    #[test]
    fn test_destination_over_fills_behind() {
        let mut s = Surface::new(10, 10).unwrap();
        s.set_fill_color(Color::from_rgba8(0, 0, 255, 255));
        s.fill_rect(0.0, 0.0, 5.0, 10.0);
        s.set_composite(CompositeOp::DestinationOver);
        s.set_fill_color(Color::WHITE);
        s.fill_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(s.pixel(2, 5).unwrap(), [0, 0, 255, 255]);
        assert_eq!(s.pixel(7, 5).unwrap(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_clear() {
        let mut s = Surface::new(4, 4).unwrap();
        s.scale(0.5, 0.5);
        s.fill_rect(0.0, 0.0, 8.0, 8.0);
        s.clear();
        assert!(s.image_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_png_signature() {
        let s = Surface::new(3, 2).unwrap();
        let png = s.to_png(PngCompression::Fast).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(PngCompression::from_quality(0.0), PngCompression::Fast);
        assert_eq!(PngCompression::from_quality(0.5), PngCompression::Default);
        assert_eq!(PngCompression::from_quality(1.0), PngCompression::Best);
        assert_eq!(PngCompression::from_quality(f64::NAN), PngCompression::Default);
    }

    #[test]
    fn test_parse_css_color() {
        let c = parse_css_color("hsla(0, 100%, 50%, 1)").unwrap().to_color_u8();
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (255, 0, 0, 255));
        assert!(parse_css_color("not-a-color").is_none());
    }
}
