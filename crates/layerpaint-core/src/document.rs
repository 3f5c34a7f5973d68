//! The document: elements, layers, viewport and history behind one mutation API.
//!
//! Every successful mutation that changes what would be painted emits a
//! [`RedrawEvent`](crate::signal::RedrawEvent) to subscribers.

use crate::element::{CanvasElement, DrawType, ElementId, ElementProperties, ElementType, LayerId};
use crate::element_store::{ElementDefaults, ElementStore};
use crate::error::{CanvasError, CanvasResult};
use crate::history::{History, HistoryAction, MAX_UNDO_HISTORY, RemovedElement};
use crate::layer::{Layer, LayerStore};
use crate::signal::{RedrawEvent, RedrawSignal};
use crate::viewport::{ShapeKind, ToolMode, Viewport};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::mpsc::Receiver;
use uuid::Uuid;

/// Initial document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub color: String,
    pub stroke_width: f64,
    pub shape_mode: DrawType,
    pub history_depth: usize,
    pub layer_name: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            dpi: 1,
            color: "hsla(0, 0%, 0%, 1)".to_string(),
            stroke_width: 2.0,
            shape_mode: DrawType::Fill,
            history_depth: MAX_UNDO_HISTORY,
            layer_name: "Layer 1".to_string(),
        }
    }
}

/// Persistable snapshot of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDocument {
    pub layers: Vec<Layer>,
    pub elements: Vec<CanvasElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

impl SavedDocument {
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug)]
pub struct Document {
    elements: ElementStore,
    layers: LayerStore,
    viewport: Viewport,
    history: History,
    signal: RedrawSignal,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentConfig::default())
    }
}

impl Document {
    /// Create a document with one active layer.
    pub fn new(config: DocumentConfig) -> Self {
        let mut viewport = Viewport::new();
        viewport.change_dimensions(config.width, config.height);
        viewport.change_dpi(config.dpi);
        viewport.change_stroke_width(config.stroke_width);
        viewport.change_shape_mode(config.shape_mode);
        if let Err(e) = viewport.change_color(&config.color) {
            log::warn!("Ignoring configured color: {}", e);
        }

        let mut layers = LayerStore::new();
        layers.set_layers(vec![Layer::new(Uuid::new_v4().to_string(), config.layer_name)]);

        Self {
            elements: ElementStore::new(),
            layers,
            viewport,
            history: History::new(config.history_depth),
            signal: RedrawSignal::new(),
        }
    }

    /// Create a document without any layer. Element creation fails until a layer exists.
    pub fn empty() -> Self {
        Self {
            elements: ElementStore::new(),
            layers: LayerStore::new(),
            viewport: Viewport::new(),
            history: History::default(),
            signal: RedrawSignal::new(),
        }
    }

    /// Rebuild a document from a saved snapshot.
    /// Elements referencing a missing layer are dropped.
    pub fn load(saved: SavedDocument) -> Self {
        let mut doc = Self::empty();
        if let Some(viewport) = saved.viewport {
            doc.viewport = viewport;
        }
        doc.layers.set_layers(saved.layers);
        let kept = live_elements(saved.elements, &doc.layers);
        doc.elements.set_elements(kept);
        log::info!(
            "Loaded document with {} layers and {} elements",
            doc.layers.len(),
            doc.elements.len()
        );
        doc
    }

    /// Snapshot layers and elements for persistence.
    pub fn prepare_for_save(&self) -> CanvasResult<SavedDocument> {
        if self.layers.is_empty() {
            return Err(CanvasError::EmptyLayerList);
        }
        Ok(SavedDocument {
            layers: self.layers.layers().to_vec(),
            elements: self.elements.elements().to_vec(),
            viewport: Some(self.viewport.clone()),
        })
    }

    pub fn subscribe(&mut self) -> Receiver<RedrawEvent> {
        self.signal.subscribe()
    }

    fn redraw(&mut self) {
        self.signal.notify();
    }

    // --- Read access ---

    pub fn elements(&self) -> &[CanvasElement] {
        self.elements.elements()
    }

    pub fn element_store(&self) -> &ElementStore {
        &self.elements
    }

    pub fn get_element(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements.get(id)
    }

    pub fn layers(&self) -> &[Layer] {
        self.layers.layers()
    }

    pub fn layer_store(&self) -> &LayerStore {
        &self.layers
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current_layer(&self) -> usize {
        self.layers.current_layer()
    }

    pub fn get_active_layer(&self) -> CanvasResult<&Layer> {
        self.layers.get_active_layer()
    }

    /// Defaults applied to newly created elements.
    pub fn element_defaults(&self) -> ElementDefaults {
        ElementDefaults {
            layer_id: self.layers.get_active_layer().ok().map(|l| l.id.clone()),
            color: self.viewport.color.clone(),
            stroke_width: self.viewport.stroke_width,
            draw_type: self.viewport.shape_mode,
        }
    }

    // --- Elements ---

    /// Create an element on the active layer without recording history.
    pub fn create_element(
        &mut self,
        element_type: ElementType,
        properties: ElementProperties,
    ) -> CanvasResult<CanvasElement> {
        let defaults = self.element_defaults();
        let element = self.elements.create_element(element_type, properties, &defaults)?;
        self.redraw();
        Ok(element)
    }

    /// Create an element and record it for undo.
    pub fn add_element(
        &mut self,
        element_type: ElementType,
        properties: ElementProperties,
    ) -> CanvasResult<ElementId> {
        let element = self.create_element(element_type, properties)?;
        let id = element.id;
        self.history.push_history(HistoryAction::AddElement { element });
        Ok(id)
    }

    /// Move an element's origin and record the move for undo.
    pub fn move_element(&mut self, id: ElementId, x: f64, y: f64) -> CanvasResult<()> {
        let element = self
            .elements
            .get(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        let action = HistoryAction::MoveElement {
            id,
            from: Point::new(element.x, element.y),
            to: Point::new(x, y),
        };
        action.apply(&mut self.elements, &self.layers)?;
        self.history.push_history(action);
        self.redraw();
        Ok(())
    }

    pub fn change_element_properties<T, P>(&mut self, transform: T, predicate: P) -> usize
    where
        T: FnMut(&mut CanvasElement),
        P: Fn(&CanvasElement) -> bool,
    {
        let changed = self.elements.change_element_properties(transform, predicate);
        if changed > 0 {
            self.redraw();
        }
        changed
    }

    /// Delete matching elements and record the deletion for undo.
    pub fn delete_element<P>(&mut self, predicate: P) -> Vec<ElementId>
    where
        P: Fn(&CanvasElement) -> bool,
    {
        let taken = self.elements.take_elements(predicate);
        if taken.is_empty() {
            return Vec::new();
        }
        let ids = taken.iter().map(|(_, e)| e.id).collect();
        let removed = taken
            .into_iter()
            .map(|(index, element)| RemovedElement { index, element })
            .collect();
        self.history
            .push_history(HistoryAction::RemoveElements { elements: removed });
        self.redraw();
        ids
    }

    /// Replace all elements. Not recorded in history.
    /// Elements referencing a missing layer are dropped.
    pub fn set_elements(&mut self, elements: Vec<CanvasElement>) {
        let kept = live_elements(elements, &self.layers);
        self.elements.set_elements(kept);
        self.redraw();
    }

    pub fn copy_element<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&CanvasElement) -> bool,
    {
        self.elements.copy_element(predicate)
    }

    /// Paste the copy buffer. Copies whose layer was removed land on the active layer.
    pub fn paste_element(&mut self) -> CanvasResult<Vec<ElementId>> {
        let ids = self.elements.paste_element(&self.layers)?;
        if !ids.is_empty() {
            self.redraw();
        }
        Ok(ids)
    }

    pub fn focus_only(&mut self, id: ElementId) -> bool {
        let found = self.elements.focus_only(id);
        self.redraw();
        found
    }

    pub fn clear_focus(&mut self) {
        self.elements.clear_focus();
        self.redraw();
    }

    // --- History ---

    pub fn push_history(&mut self, action: HistoryAction) {
        self.history.push_history(action);
    }

    pub fn undo(&mut self) -> CanvasResult<bool> {
        let undone = self.history.undo(&mut self.elements, &self.layers)?;
        if undone {
            self.redraw();
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> CanvasResult<bool> {
        let redone = self.history.redo(&mut self.elements, &self.layers)?;
        if redone {
            self.redraw();
        }
        Ok(redone)
    }

    // --- Layers ---

    pub fn create_layer(&mut self, name: Option<String>, id: Option<LayerId>) -> CanvasResult<LayerId> {
        let id = self.layers.create_layer(name, id)?;
        self.redraw();
        Ok(id)
    }

    pub fn toggle_layer(&mut self, id: &str) -> CanvasResult<()> {
        self.layers.toggle_layer(id)?;
        self.redraw();
        Ok(())
    }

    pub fn toggle_layer_visibility(&mut self, id: &str) -> CanvasResult<bool> {
        let hidden = self.layers.toggle_layer_visibility(id)?;
        self.redraw();
        Ok(hidden)
    }

    pub fn move_layer_up(&mut self, id: &str) -> CanvasResult<bool> {
        let moved = self.layers.move_layer_up(id)?;
        if moved {
            self.redraw();
        }
        Ok(moved)
    }

    pub fn move_layer_down(&mut self, id: &str) -> CanvasResult<bool> {
        let moved = self.layers.move_layer_down(id)?;
        if moved {
            self.redraw();
        }
        Ok(moved)
    }

    pub fn rename_layer(&mut self, id: &str, new_name: impl Into<String>) -> CanvasResult<()> {
        self.layers.rename_layer(id, new_name)?;
        self.redraw();
        Ok(())
    }

    /// Remove a layer and every element on it.
    /// History entries that reference those elements are discarded.
    /// Returns false when the layer is the last one and was kept.
    pub fn remove_layer(&mut self, id: &str) -> CanvasResult<bool> {
        let Some(removed) = self.layers.remove_layer(id)? else {
            return Ok(false);
        };
        let dropped = self.elements.delete_element(|e| e.layer_id == removed.id);
        self.history.forget_elements(&dropped);
        log::debug!(
            "Removed layer {} with {} elements",
            removed.id,
            dropped.len()
        );
        self.redraw();
        Ok(true)
    }

    pub fn set_layers(&mut self, layers: Vec<Layer>) {
        self.layers.set_layers(layers);
        self.redraw();
    }

    // --- Viewport ---

    pub fn change_dimensions(&mut self, width: u32, height: u32) {
        self.viewport.change_dimensions(width, height);
        self.redraw();
    }

    pub fn change_dpi(&mut self, dpi: u32) {
        self.viewport.change_dpi(dpi);
        self.redraw();
    }

    pub fn change_color(&mut self, color: &str) -> CanvasResult<()> {
        self.viewport.change_color(color)
    }

    pub fn change_color_alpha(&mut self, alpha: f64) -> CanvasResult<()> {
        self.viewport.change_color_alpha(alpha)
    }

    pub fn change_mode(&mut self, mode: ToolMode) {
        self.viewport.change_mode(mode);
    }

    pub fn change_shape(&mut self, shape: ShapeKind) {
        self.viewport.change_shape(shape);
    }

    pub fn change_shape_mode(&mut self, shape_mode: DrawType) {
        self.viewport.change_shape_mode(shape_mode);
    }

    pub fn change_stroke_width(&mut self, width: f64) {
        self.viewport.change_stroke_width(width);
    }

    pub fn increase_scale(&mut self) {
        self.viewport.increase_scale();
    }

    pub fn decrease_scale(&mut self) {
        self.viewport.decrease_scale();
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.viewport.set_position(x, y);
    }

    pub fn change_x(&mut self, dx: f64) {
        self.viewport.change_x(dx);
    }

    pub fn change_y(&mut self, dy: f64) {
        self.viewport.change_y(dy);
    }
}

fn live_elements(elements: Vec<CanvasElement>, layers: &LayerStore) -> Vec<CanvasElement> {
    let live: HashSet<&str> = layers.layers().iter().map(|l| l.id.as_str()).collect();
    let (kept, dropped): (Vec<_>, Vec<_>) = elements
        .into_iter()
        .partition(|e| live.contains(e.layer_id.as_str()));
    for element in &dropped {
        log::warn!(
            "Dropping element {} on missing layer {}",
            element.id,
            element.layer_id
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TextSpec;
    use crate::signal::drain;

    fn rect(doc: &mut Document) -> ElementId {
        doc.add_element(
            ElementType::Rectangle,
            ElementProperties::new().with_size(10.0, 10.0),
        )
        .unwrap()
    }

    #[test]
    fn test_new_document_has_active_layer() {
        let doc = Document::default();
        assert_eq!(doc.layers().len(), 1);
        let active = doc.get_active_layer().unwrap();
        assert_eq!(active.name, "Layer 1");
        assert_eq!(doc.viewport().width, 800);
        assert_eq!(doc.viewport().color, "hsla(0, 0%, 0%, 1)");
    }

    #[test]
    fn test_element_lands_on_active_layer() {
        let mut doc = Document::default();
        let second = doc.create_layer(Some("Top".to_string()), None).unwrap();
        doc.toggle_layer(&second).unwrap();
        let id = rect(&mut doc);
        assert_eq!(doc.get_element(id).unwrap().layer_id, second);
    }

    #[test]
    fn test_create_without_layers_fails() {
        let mut doc = Document::empty();
        let result = doc.create_element(ElementType::Rectangle, ElementProperties::new());
        assert!(matches!(result, Err(CanvasError::NoActiveLayer)));
        let text = doc.create_element(ElementType::Text, ElementProperties::new());
        assert!(text.is_err());
    }

    #[test]
    fn test_text_element_with_properties() {
        let mut doc = Document::default();
        let el = doc
            .create_element(
                ElementType::Text,
                ElementProperties::new().with_text(TextSpec::new("Title")),
            )
            .unwrap();
        assert_eq!(el.element_type(), ElementType::Text);
    }

    #[test]
    fn test_undo_restores_pre_state_exactly() {
        let mut doc = Document::default();
        rect(&mut doc);
        let before = doc.elements().to_vec();
        let id = rect(&mut doc);
        let after = doc.elements().to_vec();

        assert!(doc.undo().unwrap());
        assert_eq!(doc.elements(), before.as_slice());
        assert!(doc.redo().unwrap());
        assert_eq!(doc.elements(), after.as_slice());
        assert!(doc.get_element(id).is_some());
    }

    #[test]
    fn test_move_element_roundtrip() {
        let mut doc = Document::default();
        let id = rect(&mut doc);
        doc.move_element(id, 100.0, 200.0).unwrap();
        assert_eq!(doc.get_element(id).unwrap().x, 100.0);
        doc.undo().unwrap();
        assert_eq!(doc.get_element(id).unwrap().x, 0.0);
        assert!(matches!(
            doc.move_element(uuid::Uuid::new_v4(), 0.0, 0.0),
            Err(CanvasError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_delete_is_undoable() {
        let mut doc = Document::default();
        let a = rect(&mut doc);
        let b = rect(&mut doc);
        let before = doc.elements().to_vec();
        assert_eq!(doc.delete_element(|e| e.id == a), vec![a]);
        assert_eq!(doc.elements().len(), 1);
        doc.undo().unwrap();
        assert_eq!(doc.elements(), before.as_slice());
        assert_eq!(doc.elements()[1].id, b);
    }

    #[test]
    fn test_remove_layer_cascades() {
        let mut doc = Document::default();
        let first = doc.get_active_layer().unwrap().id.clone();
        let second = doc.create_layer(None, None).unwrap();
        rect(&mut doc);
        doc.toggle_layer(&second).unwrap();
        let kept = rect(&mut doc);

        assert!(doc.remove_layer(&first).unwrap());
        assert_eq!(doc.elements().len(), 1);
        assert_eq!(doc.elements()[0].id, kept);
        assert!(!doc.remove_layer(&second).unwrap());
        assert_eq!(doc.get_active_layer().unwrap().id, second);
    }

    #[test]
    fn test_undo_continues_past_removed_layer() {
        let mut doc = Document::default();
        let base = doc.get_active_layer().unwrap().id.clone();
        let older = rect(&mut doc);
        let doomed = doc.create_layer(None, None).unwrap();
        doc.toggle_layer(&doomed).unwrap();
        let on_doomed = rect(&mut doc);
        doc.move_element(on_doomed, 3.0, 4.0).unwrap();

        doc.toggle_layer(&base).unwrap();
        assert!(doc.remove_layer(&doomed).unwrap());
        assert_eq!(doc.history().undo_len(), 1);

        assert!(doc.undo().unwrap());
        assert!(doc.get_element(older).is_none());
        assert!(!doc.undo().unwrap());
        assert!(doc.redo().unwrap());
        assert!(doc.get_element(older).is_some());
    }

    #[test]
    fn test_paste_after_source_layer_removed() {
        let mut doc = Document::default();
        let first = doc.get_active_layer().unwrap().id.clone();
        let second = doc.create_layer(None, None).unwrap();
        let source = rect(&mut doc);
        assert_eq!(doc.copy_element(|e| e.id == source), 1);

        doc.toggle_layer(&second).unwrap();
        assert!(doc.remove_layer(&first).unwrap());
        let pasted = doc.paste_element().unwrap();
        assert_eq!(pasted.len(), 1);
        assert_eq!(doc.get_element(pasted[0]).unwrap().layer_id, second);
        assert!(doc.elements().iter().all(|e| doc.layer_store().contains(&e.layer_id)));
    }

    #[test]
    fn test_set_elements_drops_dangling() {
        let mut doc = Document::default();
        let id = rect(&mut doc);
        let mut elements = doc.elements().to_vec();
        let mut stray = elements[0].clone();
        stray.id = Uuid::new_v4();
        stray.layer_id = "ghost".to_string();
        elements.push(stray);

        doc.set_elements(elements);
        assert_eq!(doc.elements().len(), 1);
        assert_eq!(doc.elements()[0].id, id);
    }

    #[test]
    fn test_redraw_emitted_after_mutations() {
        let mut doc = Document::default();
        let rx = doc.subscribe();
        let id = rect(&mut doc);
        doc.move_element(id, 5.0, 5.0).unwrap();
        doc.undo().unwrap();
        assert_eq!(drain(&rx), 3);

        // Failed or no-op calls stay silent.
        assert!(doc.toggle_layer("nope").is_err());
        doc.increase_scale();
        assert_eq!(drain(&rx), 0);
    }

    #[test]
    fn test_save_and_load() {
        let mut doc = Document::default();
        rect(&mut doc);
        let saved = doc.prepare_for_save().unwrap();
        let json = saved.to_json().unwrap();
        let loaded = Document::load(SavedDocument::from_json(&json).unwrap());
        assert_eq!(loaded.elements(), doc.elements());
        assert_eq!(loaded.layers(), doc.layers());
        assert_eq!(loaded.viewport(), doc.viewport());
    }

    #[test]
    fn test_load_drops_dangling_elements() {
        let mut doc = Document::default();
        rect(&mut doc);
        let mut saved = doc.prepare_for_save().unwrap();
        saved.elements[0].layer_id = "ghost".to_string();
        let loaded = Document::load(saved);
        assert!(loaded.elements().is_empty());
    }

    #[test]
    fn test_save_without_layers_fails() {
        let doc = Document::empty();
        assert!(matches!(doc.prepare_for_save(), Err(CanvasError::EmptyLayerList)));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: DocumentConfig = serde_json::from_str(r#"{"width": 320, "dpi": 2}"#).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        let doc = Document::new(config);
        assert_eq!(doc.viewport().export_size(), (640, 1200));
    }
}
