//! Layers and the layer store.
//!
//! Vector position is z-order: later layers paint on top. Whenever the list is
//! non-empty exactly one layer is active, and `current_layer` is its index.

use crate::element::LayerId;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::swap_elements;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, orderable, hideable layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl Layer {
    pub fn new(id: impl Into<LayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: false,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: Vec<Layer>,
    current_layer: usize,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new layer. The first layer of an empty store becomes active.
    pub fn create_layer(&mut self, name: Option<String>, id: Option<LayerId>) -> CanvasResult<LayerId> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.index_of(&id).is_some() {
            return Err(CanvasError::DuplicateLayer(id));
        }
        let name = name.unwrap_or_else(|| format!("Layer {}", self.layers.len() + 1));

        let mut layer = Layer::new(id.clone(), name);
        if self.layers.is_empty() {
            layer.active = true;
            self.current_layer = 0;
        }
        log::debug!("Created layer {} ({})", layer.name, layer.id);
        self.layers.push(layer);
        Ok(id)
    }

    /// Make `id` the single active layer.
    pub fn toggle_layer(&mut self, id: &str) -> CanvasResult<()> {
        let index = self.require(id)?;
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.active = i == index;
        }
        self.current_layer = index;
        Ok(())
    }

    /// Flip the hidden flag. Does not affect which layer is active.
    pub fn toggle_layer_visibility(&mut self, id: &str) -> CanvasResult<bool> {
        let index = self.require(id)?;
        let layer = &mut self.layers[index];
        layer.hidden = !layer.hidden;
        Ok(layer.hidden)
    }

    /// Swap with the layer below. Returns false when already first.
    pub fn move_layer_up(&mut self, id: &str) -> CanvasResult<bool> {
        let index = self.require(id)?;
        if index == 0 {
            return Ok(false);
        }
        let moved = swap_elements(&mut self.layers, index, index - 1);
        self.sync_current();
        Ok(moved)
    }

    /// Swap with the layer above. Returns false when already last.
    pub fn move_layer_down(&mut self, id: &str) -> CanvasResult<bool> {
        let index = self.require(id)?;
        let moved = swap_elements(&mut self.layers, index, index + 1);
        if moved {
            self.sync_current();
        }
        Ok(moved)
    }

    pub fn rename_layer(&mut self, id: &str, new_name: impl Into<String>) -> CanvasResult<()> {
        let index = self.require(id)?;
        self.layers[index].name = new_name.into();
        Ok(())
    }

    /// Remove a layer. A no-op returning `Ok(None)` when it is the last one left.
    /// If the removed layer was active the first remaining layer is promoted.
    pub fn remove_layer(&mut self, id: &str) -> CanvasResult<Option<Layer>> {
        let index = self.require(id)?;
        if self.layers.len() <= 1 {
            log::debug!("Refusing to remove the last layer {}", id);
            return Ok(None);
        }

        let removed = self.layers.remove(index);
        if removed.active {
            if let Some(first) = self.layers.first_mut() {
                first.active = true;
            }
        }
        self.sync_current();
        Ok(Some(removed))
    }

    pub fn get_active_layer(&self) -> CanvasResult<&Layer> {
        if self.layers.is_empty() {
            return Err(CanvasError::EmptyLayerList);
        }
        self.layers
            .iter()
            .find(|l| l.active)
            .ok_or(CanvasError::NoActiveLayer)
    }

    /// Bulk load. Normalizes to exactly one active layer: the first flagged one,
    /// or the first layer when none is flagged.
    pub fn set_layers(&mut self, mut layers: Vec<Layer>) {
        let active = layers.iter().position(|l| l.active).unwrap_or(0);
        for (i, layer) in layers.iter_mut().enumerate() {
            layer.active = i == active;
        }
        self.layers = layers;
        self.current_layer = if self.layers.is_empty() { 0 } else { active };
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn current_layer(&self) -> usize {
        self.current_layer
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn require(&self, id: &str) -> CanvasResult<usize> {
        self.index_of(id)
            .ok_or_else(|| CanvasError::LayerNotFound(id.to_string()))
    }

    fn sync_current(&mut self) {
        self.current_layer = self.layers.iter().position(|l| l.active).unwrap_or(0);
    }
}
