//! Small geometry helpers shared by the stores and interactive collaborators.

use kurbo::{Point, Rect};

/// Map a pointer position in client space onto the drawing surface.
///
/// `canvas_bounds` is the surface's on-screen rectangle and `scale` the current
/// zoom factor; the result is in document space.
pub fn get_canvas_pointer_position(client: Point, canvas_bounds: Rect, scale: f64) -> Point {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    Point::new(
        (client.x - canvas_bounds.x0) / scale,
        (client.y - canvas_bounds.y0) / scale,
    )
}

/// Swap two entries of a slice.
/// Returns false (and leaves the slice untouched) if either index is out of range.
pub fn swap_elements<T>(items: &mut [T], a: usize, b: usize) -> bool {
    if a >= items.len() || b >= items.len() {
        return false;
    }
    items.swap(a, b);
    true
}

/// Translate every point of a path by the given offset.
pub fn offset_points(points: &mut [Point], dx: f64, dy: f64) {
    for p in points.iter_mut() {
        p.x += dx;
        p.y += dy;
    }
}

/// Bounding box of a point sequence, or None if it is empty.
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut rect = Rect::from_points(*first, *first);
    for p in &points[1..] {
        rect = rect.union_pt(*p);
    }
    Some(rect)
}
