//! Notifications the canvas engine emits to external collaborators.
//!
//! The engine never calls listeners directly; it pushes [`CanvasEvent`]s into
//! an mpsc channel so an embedding application can react (snapshot state for
//! undo, persist connections, spawn editors) without coupling the canvas to
//! any of that machinery.

use crate::model::{NodeId, PortId};
use serde::{Deserialize, Serialize};

/// Tags describing what kind of mutation is about to happen.
///
/// Emitted inside [`CanvasEvent::BeforeChange`] before the mutation is
/// applied, so a listener can snapshot the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A node position is about to be committed.
    Move,
    /// A new connection is about to be created.
    Connect,
    /// A node or connection is about to be removed.
    Deletion,
    /// A new workflow input is about to be created from a port drag.
    InputCreate,
    /// A new workflow output is about to be created from a port drag.
    OutputCreate,
}

/// Events emitted by the canvas engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanvasEvent {
    /// Fired before any mutating operation with a tag describing it.
    BeforeChange(ChangeKind),
    /// A connection between two ports was created on the canvas.
    ConnectionCreated {
        /// Node owning the source port.
        source_node: NodeId,
        /// Port the connection originates from.
        source_port: PortId,
        /// Node owning the destination port.
        dest_node: NodeId,
        /// Port the connection terminates at.
        dest_port: PortId,
    },
    /// A port-drag release in empty space spawned a new input or output node.
    NodeCreated {
        /// Identifier of the node that was created.
        node: NodeId,
        /// True when the new node is a workflow input, false for an output.
        is_input: bool,
    },
}
