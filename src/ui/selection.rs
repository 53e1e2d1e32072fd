//! Selection and highlight management.
//!
//! Exactly one element (node or edge) holds the selected designation at a
//! time. Highlight flags on the scene are a derived projection of that
//! selection — recomputed wholesale on every change and clearable in one
//! pass.

use super::scene::NodeKind;
use super::state::{CanvasApp, SelectedElement};
use crate::events::{CanvasEvent, ChangeKind};
use crate::model::NodeId;

impl CanvasApp {
    /// Selects a node and highlights its neighborhood: every edge whose
    /// endpoint set includes it, and every node at the other end of those
    /// edges.
    pub fn select_node(&mut self, id: NodeId) {
        self.selection.selected = Some(SelectedElement::Node(id));
        self.reapply_selection_highlight();
    }

    /// Selects an edge and highlights the two ports it connects.
    pub fn select_edge(&mut self, index: usize) {
        self.selection.selected = Some(SelectedElement::Edge(index));
        self.reapply_selection_highlight();
    }

    /// Clears the selection and every highlight flag.
    ///
    /// Safe to call with no active selection.
    pub fn clear_selection(&mut self) {
        self.selection.selected = None;
        self.scene.clear_highlights();
    }

    /// Recomputes every highlight flag from the current selection.
    pub(crate) fn reapply_selection_highlight(&mut self) {
        self.scene.clear_highlights();
        match self.selection.selected {
            Some(SelectedElement::Node(id)) => {
                let mut neighbors = Vec::new();
                for edge in &mut self.scene.edges {
                    if edge.source_node == id {
                        edge.highlighted = true;
                        neighbors.push(edge.dest_node);
                    } else if edge.dest_node == id {
                        edge.highlighted = true;
                        neighbors.push(edge.source_node);
                    }
                }
                for neighbor in neighbors {
                    if let Some(node) = self.scene.nodes.get_mut(&neighbor) {
                        node.highlighted = true;
                    }
                }
            }
            Some(SelectedElement::Edge(index)) => {
                if let Some(edge) = self.scene.edges.get(index) {
                    self.scene.highlighted_ports = vec![
                        edge.source_port.clone(),
                        edge.dest_port.clone(),
                    ];
                } else {
                    self.selection.selected = None;
                }
            }
            None => {}
        }
    }

    /// Deletes the selected element, if any.
    ///
    /// Emits a pre-change notification, calls the matching model removal or
    /// disconnect operation, and triggers a full re-render. An empty
    /// selection performs no mutation.
    pub fn delete_selection(&mut self) {
        let Some(selected) = self.selection.selected else {
            return;
        };
        self.emit(CanvasEvent::BeforeChange(ChangeKind::Deletion));

        match selected {
            SelectedElement::Node(id) => {
                match self.scene.nodes.get(&id).map(|n| n.kind) {
                    Some(NodeKind::Step) => {
                        self.model.remove_step(id);
                    }
                    Some(NodeKind::Input) => {
                        self.model.remove_input(id);
                    }
                    Some(NodeKind::Output) => {
                        self.model.remove_output(id);
                    }
                    None => {}
                }
            }
            SelectedElement::Edge(index) => {
                if let Some(edge) = self.scene.edges.get(index) {
                    let (source, dest) = (edge.source_port.clone(), edge.dest_port.clone());
                    self.model.disconnect(&source, &dest);
                }
            }
        }

        self.render();
    }
}
