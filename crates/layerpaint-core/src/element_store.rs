//! Element store: creation, mutation, deletion and the copy buffer.

use crate::element::{
    CanvasElement, DrawType, ElementId, ElementKind, ElementProperties, ElementType, LayerId,
};
use crate::error::{CanvasError, CanvasResult};
use crate::layer::LayerStore;
use uuid::Uuid;

/// Offset applied to every pasted element.
pub const PASTE_OFFSET: f64 = 10.0;

/// Minimum width/height/stroke width of an element.
pub const MIN_ELEMENT_SIZE: f64 = 1.0;

/// Values taken from the layer and viewport stores when creating an element.
#[derive(Debug, Clone)]
pub struct ElementDefaults {
    /// Layer new elements are placed on. None when no layer is active.
    pub layer_id: Option<LayerId>,
    pub color: String,
    pub stroke_width: f64,
    pub draw_type: DrawType,
}

/// Ordered list of elements (document order = paint order) plus the clipboard.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<CanvasElement>,
    copied: Vec<CanvasElement>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an element from properties merged over the defaults, without inserting it.
    pub fn build_element(
        element_type: ElementType,
        properties: ElementProperties,
        defaults: &ElementDefaults,
    ) -> CanvasResult<CanvasElement> {
        let layer_id = defaults.layer_id.clone().ok_or(CanvasError::NoActiveLayer)?;

        let kind = match element_type {
            ElementType::Rectangle => ElementKind::Rectangle,
            ElementType::Circle => ElementKind::Circle,
            ElementType::Triangle => ElementKind::Triangle {
                inverted: properties.inverted.unwrap_or(false),
            },
            ElementType::Text => ElementKind::Text {
                text: properties.text.ok_or(CanvasError::MissingTextProperties)?,
            },
            ElementType::Brush => ElementKind::Brush {
                path: properties.path.unwrap_or_default(),
            },
            ElementType::Eraser => ElementKind::Eraser {
                path: properties.path.unwrap_or_default(),
            },
        };

        let draw_type = if element_type.is_freehand() {
            DrawType::Stroke
        } else {
            properties.draw_type.unwrap_or(defaults.draw_type)
        };
        let opacity = if element_type == ElementType::Eraser {
            1.0
        } else {
            clamp_opacity(properties.opacity.unwrap_or(1.0))
        };

        Ok(CanvasElement {
            id: Uuid::new_v4(),
            kind,
            x: properties.x.unwrap_or(0.0),
            y: properties.y.unwrap_or(0.0),
            width: clamp_size(properties.width.unwrap_or(MIN_ELEMENT_SIZE)),
            height: clamp_size(properties.height.unwrap_or(MIN_ELEMENT_SIZE)),
            fill: properties.fill.unwrap_or_else(|| defaults.color.clone()),
            stroke: properties.stroke.unwrap_or_else(|| defaults.color.clone()),
            stroke_width: clamp_size(properties.stroke_width.unwrap_or(defaults.stroke_width)),
            opacity,
            draw_type,
            layer_id,
            focused: false,
        })
    }

    /// Create an element and append it on top of the document.
    pub fn create_element(
        &mut self,
        element_type: ElementType,
        properties: ElementProperties,
        defaults: &ElementDefaults,
    ) -> CanvasResult<CanvasElement> {
        let element = Self::build_element(element_type, properties, defaults)?;
        log::debug!("Created {:?} element {}", element_type, element.id);
        self.elements.push(element.clone());
        Ok(element)
    }

    /// Apply `transform` to every element matching `predicate`.
    /// Width and height are clamped to the minimum afterwards. Returns the number changed.
    pub fn change_element_properties<T, P>(&mut self, mut transform: T, predicate: P) -> usize
    where
        T: FnMut(&mut CanvasElement),
        P: Fn(&CanvasElement) -> bool,
    {
        let mut changed = 0;
        for element in self.elements.iter_mut().filter(|e| predicate(e)) {
            let id = element.id;
            transform(element);
            // Ids are immutable.
            element.id = id;

            if !is_valid_size(element.width) || !is_valid_size(element.height) {
                log::warn!(
                    "Element {} has invalid size {}x{}, clamping",
                    id,
                    element.width,
                    element.height
                );
                element.width = clamp_size(element.width);
                element.height = clamp_size(element.height);
            }
            changed += 1;
        }
        changed
    }

    /// Remove every element matching `predicate`. Returns the removed ids.
    pub fn delete_element<P>(&mut self, predicate: P) -> Vec<ElementId>
    where
        P: Fn(&CanvasElement) -> bool,
    {
        let mut removed = Vec::new();
        self.elements.retain(|e| {
            if predicate(e) {
                removed.push(e.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove matching elements, returning them with their former indices (ascending).
    pub fn take_elements<P>(&mut self, predicate: P) -> Vec<(usize, CanvasElement)>
    where
        P: Fn(&CanvasElement) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.elements.len());
        for (index, element) in std::mem::take(&mut self.elements).into_iter().enumerate() {
            if predicate(&element) {
                taken.push((index, element));
            } else {
                kept.push(element);
            }
        }
        self.elements = kept;
        taken
    }

    /// Replace the whole element list.
    pub fn set_elements(&mut self, elements: Vec<CanvasElement>) {
        self.elements = elements;
    }

    /// Append an existing element.
    pub fn insert(&mut self, element: CanvasElement) {
        self.elements.push(element);
    }

    /// Insert an element at a paint-order index (clamped to the end).
    pub fn insert_at(&mut self, index: usize, element: CanvasElement) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
    }

    /// Snapshot matching elements into the copy buffer. Returns how many were copied.
    pub fn copy_element<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&CanvasElement) -> bool,
    {
        self.copied = self.elements.iter().filter(|e| predicate(e)).cloned().collect();
        self.copied.len()
    }

    /// Paste the copy buffer with fresh ids, shifted by `PASTE_OFFSET`.
    /// The buffer is replaced by the pasted set so repeated pastes keep shifting.
    ///
    /// Copies whose layer no longer exists are moved to the active layer; the
    /// paste fails without changes when there is none.
    pub fn paste_element(&mut self, layers: &LayerStore) -> CanvasResult<Vec<ElementId>> {
        let orphaned = self.copied.iter().any(|e| !layers.contains(&e.layer_id));
        let fallback = if orphaned {
            Some(layers.get_active_layer()?.id.clone())
        } else {
            None
        };

        let pasted: Vec<CanvasElement> = self
            .copied
            .iter()
            .map(|source| {
                let mut element = source.clone();
                element.id = Uuid::new_v4();
                element.focused = false;
                element.translate(PASTE_OFFSET, PASTE_OFFSET);
                if let Some(layer_id) = &fallback {
                    if !layers.contains(&element.layer_id) {
                        element.layer_id = layer_id.clone();
                    }
                }
                element
            })
            .collect();

        let ids = pasted.iter().map(|e| e.id).collect();
        self.elements.extend(pasted.iter().cloned());
        self.copied = pasted;
        Ok(ids)
    }

    pub fn copied(&self) -> &[CanvasElement] {
        &self.copied
    }

    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements_on_layer<'a>(
        &'a self,
        layer_id: &'a str,
    ) -> impl Iterator<Item = &'a CanvasElement> + 'a {
        self.elements.iter().filter(move |e| e.layer_id == layer_id)
    }

    /// Mark a single element as focused, clearing the flag on all others.
    pub fn focus_only(&mut self, id: ElementId) -> bool {
        let mut found = false;
        for element in &mut self.elements {
            element.focused = element.id == id;
            found |= element.focused;
        }
        found
    }

    pub fn clear_focus(&mut self) {
        for element in &mut self.elements {
            element.focused = false;
        }
    }
}

fn is_valid_size(v: f64) -> bool {
    v.is_finite() && v >= MIN_ELEMENT_SIZE
}

fn clamp_size(v: f64) -> f64 {
    if v.is_finite() { v.max(MIN_ELEMENT_SIZE) } else { MIN_ELEMENT_SIZE }
}

fn clamp_opacity(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 }
}
