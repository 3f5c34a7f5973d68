//! Command-style undo/redo.
//!
//! Every reversible mutation is recorded as a serializable [`HistoryAction`]
//! holding enough data to replay it in both directions. Actions are stored by
//! value in two stacks whose head is the end of the `Vec`.

use crate::element::{CanvasElement, ElementId};
use crate::element_store::ElementStore;
use crate::error::{CanvasError, CanvasResult};
use crate::layer::LayerStore;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default bound of the undo stack.
pub const MAX_UNDO_HISTORY: usize = 100;

/// An element removed from the document, with its former paint-order index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedElement {
    pub index: usize,
    pub element: CanvasElement,
}

/// A recorded, reversible mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryAction {
    AddElement {
        element: CanvasElement,
    },
    MoveElement {
        id: ElementId,
        from: Point,
        to: Point,
    },
    RemoveElements {
        elements: Vec<RemovedElement>,
    },
}

impl HistoryAction {
    /// Parse an action, rejecting a missing or unknown `type`.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(|e| CanvasError::MalformedAction(e.to_string()))
    }

    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Replay the action forward. Validates before mutating.
    pub fn apply(&self, elements: &mut ElementStore, layers: &LayerStore) -> CanvasResult<()> {
        match self {
            HistoryAction::AddElement { element } => {
                check_insertable(std::slice::from_ref(element), elements, layers)?;
                elements.insert(element.clone());
            }
            HistoryAction::MoveElement { id, to, .. } => {
                move_existing(elements, *id, *to)?;
            }
            HistoryAction::RemoveElements { elements: removed } => {
                check_present(removed.iter().map(|r| r.element.id), elements)?;
                elements.take_elements(|e| removed.iter().any(|r| r.element.id == e.id));
            }
        }
        Ok(())
    }

    /// Apply the inverse of the action. Validates before mutating.
    pub fn invert(&self, elements: &mut ElementStore, layers: &LayerStore) -> CanvasResult<()> {
        match self {
            HistoryAction::AddElement { element } => {
                check_present(std::iter::once(element.id), elements)?;
                elements.delete_element(|e| e.id == element.id);
            }
            HistoryAction::MoveElement { id, from, .. } => {
                move_existing(elements, *id, *from)?;
            }
            HistoryAction::RemoveElements { elements: removed } => {
                let snapshots: Vec<CanvasElement> =
                    removed.iter().map(|r| r.element.clone()).collect();
                check_insertable(&snapshots, elements, layers)?;

                let mut ordered: Vec<&RemovedElement> = removed.iter().collect();
                ordered.sort_by_key(|r| r.index);
                for r in ordered {
                    elements.insert_at(r.index, r.element.clone());
                }
            }
        }
        Ok(())
    }

    /// Strip references to `ids`. Returns false when nothing of the action is left.
    fn retain_without(&mut self, ids: &HashSet<ElementId>) -> bool {
        match self {
            HistoryAction::AddElement { element } => !ids.contains(&element.id),
            HistoryAction::MoveElement { id, .. } => !ids.contains(id),
            HistoryAction::RemoveElements { elements } => {
                elements.retain(|r| !ids.contains(&r.element.id));
                !elements.is_empty()
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            HistoryAction::AddElement { .. } => "add_element",
            HistoryAction::MoveElement { .. } => "move_element",
            HistoryAction::RemoveElements { .. } => "remove_elements",
        }
    }
}

fn check_present(
    mut ids: impl Iterator<Item = ElementId>,
    elements: &ElementStore,
) -> CanvasResult<()> {
    match ids.find(|id| !elements.contains(*id)) {
        Some(id) => Err(CanvasError::MalformedAction(format!(
            "element {id} does not exist"
        ))),
        None => Ok(()),
    }
}

fn check_insertable(
    snapshots: &[CanvasElement],
    elements: &ElementStore,
    layers: &LayerStore,
) -> CanvasResult<()> {
    for element in snapshots {
        if elements.contains(element.id) {
            return Err(CanvasError::MalformedAction(format!(
                "element {} already exists",
                element.id
            )));
        }
        if !layers.contains(&element.layer_id) {
            return Err(CanvasError::MalformedAction(format!(
                "layer {} does not exist",
                element.layer_id
            )));
        }
    }
    Ok(())
}

fn move_existing(elements: &mut ElementStore, id: ElementId, to: Point) -> CanvasResult<()> {
    let element = elements
        .get_mut(id)
        .ok_or_else(|| CanvasError::MalformedAction(format!("element {id} does not exist")))?;
    element.move_to(to.x, to.y);
    Ok(())
}

/// Undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryAction>,
    redo_stack: Vec<HistoryAction>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record an action that has already been applied. Clears the redo stack.
    pub fn push_history(&mut self, action: HistoryAction) {
        log::debug!("Recorded {}", action.name());
        self.undo_stack.push(action);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent action.
    /// Returns false if there was nothing to undo. On failure the action stays on the undo stack.
    pub fn undo(&mut self, elements: &mut ElementStore, layers: &LayerStore) -> CanvasResult<bool> {
        let Some(action) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = action.invert(elements, layers) {
            log::error!("Failed to undo {}: {}", action.name(), e);
            self.undo_stack.push(action);
            return Err(e);
        }
        self.redo_stack.push(action);
        Ok(true)
    }

    /// Redo the most recently undone action.
    /// Returns false if there was nothing to redo. On failure the action stays on the redo stack.
    pub fn redo(&mut self, elements: &mut ElementStore, layers: &LayerStore) -> CanvasResult<bool> {
        let Some(action) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = action.apply(elements, layers) {
            log::error!("Failed to redo {}: {}", action.name(), e);
            self.redo_stack.push(action);
            return Err(e);
        }
        self.undo_stack.push(action);
        Ok(true)
    }

    /// Forget every recorded reference to elements that no longer exist
    /// outside history (e.g. deleted with their layer).
    /// Returns the number of actions dropped from both stacks.
    pub fn forget_elements(&mut self, ids: &[ElementId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let ids: HashSet<ElementId> = ids.iter().copied().collect();
        let before = self.undo_stack.len() + self.redo_stack.len();
        for stack in [&mut self.undo_stack, &mut self.redo_stack] {
            stack.retain_mut(|action| action.retain_without(&ids));
        }
        let dropped = before - (self.undo_stack.len() + self.redo_stack.len());
        if dropped > 0 {
            log::debug!("Dropped {} history actions for {} elements", dropped, ids.len());
        }
        dropped
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Most recent undoable action.
    pub fn peek_undo(&self) -> Option<&HistoryAction> {
        self.undo_stack.last()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
