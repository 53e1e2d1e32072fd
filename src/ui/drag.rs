//! Drag session control: node moves, canvas pans, and the handoff into
//! port-to-port connection drawing.
//!
//! A session runs `Idle -> Active(kind) -> Idle` per pointer-down/up cycle;
//! only one session is ever active. All position math is expressed as deltas
//! against baselines captured at session start (plus the auto-scroll
//! accumulator), so pointer moves and scroll ticks can interleave freely
//! without double-counting motion.

use super::state::{CanvasApp, DragSession, NodeMoveDrag, PanDrag};
use crate::constants::CLICK_THRESHOLD;
use crate::events::{CanvasEvent, ChangeKind};
use crate::model::NodeId;
use eframe::egui;

impl CanvasApp {
    /// Starts a drag session for a pointer press at the given screen
    /// position.
    ///
    /// Dispatch order: middle button pans; a press over a port starts a
    /// connection draw; over a node body, a node move; over an edge, the
    /// edge is selected without a session; anywhere else, a pan.
    ///
    /// A press while a session is already active is ignored (sessions are
    /// serialized by the pointer that originates them).
    pub fn begin_drag(&mut self, screen_pos: egui::Pos2, middle_button: bool) {
        if self.drag.is_some() {
            return;
        }

        let canvas_pos = self.viewport.screen_to_canvas(screen_pos);

        if middle_button {
            self.start_pan(screen_pos);
            return;
        }
        if let Some((node, port, role)) = self.scene.port_at(canvas_pos) {
            self.start_port_drag(node, port, role, screen_pos);
            return;
        }
        if let Some(node) = self.scene.node_at(canvas_pos) {
            self.start_node_move(node, screen_pos);
            return;
        }
        if let Some(edge) = self.scene.edge_at(canvas_pos) {
            self.select_edge(edge);
            return;
        }
        self.start_pan(screen_pos);
    }

    /// Routes a pointer move to the active session, if any.
    pub fn update_drag(&mut self, screen_pos: egui::Pos2) {
        let zoom = self.viewport.zoom;
        match &mut self.drag {
            Some(DragSession::NodeMove(drag)) => {
                drag.pointer_last = screen_pos;
                if (screen_pos - drag.pointer_start).length() / zoom >= CLICK_THRESHOLD {
                    drag.moved = true;
                }
            }
            Some(DragSession::Pan(drag)) => {
                // Raw pointer delta: panning moves screen pixels 1:1
                // regardless of zoom
                let delta = screen_pos - drag.pointer_start;
                if delta.length() >= CLICK_THRESHOLD {
                    drag.moved = true;
                }
                self.viewport.offset = drag.start_offset + delta;
            }
            Some(DragSession::PortDraw(drag)) => {
                drag.pointer_last = screen_pos;
            }
            None => {}
        }
        match &self.drag {
            Some(DragSession::NodeMove(_)) => self.refresh_node_move(),
            Some(DragSession::PortDraw(_)) => self.refresh_port_drag(),
            _ => {}
        }
    }

    /// Ends the active session at pointer release.
    ///
    /// Commits a node move to the model, interprets a motionless pan as a
    /// blank-canvas click (clearing the selection), and hands a connection
    /// draw to the resolver's release logic. Always stops the auto-scroll
    /// timer, regardless of where the pointer ended up.
    pub fn end_drag(&mut self) {
        match self.drag.take() {
            Some(DragSession::NodeMove(drag)) => {
                if drag.moved {
                    if let Some(node) = self.scene.nodes.get(&drag.node) {
                        let position = (node.position.x, node.position.y);
                        self.emit(CanvasEvent::BeforeChange(ChangeKind::Move));
                        self.model.set_position(drag.node, position);
                    }
                }
                log::debug!("node move session ended for {}", drag.node);
            }
            Some(DragSession::Pan(drag)) => {
                if !drag.moved {
                    // A click on blank canvas clears the selection
                    self.clear_selection();
                }
            }
            Some(DragSession::PortDraw(drag)) => {
                self.release_port_drag(drag);
            }
            None => {}
        }
        self.auto_scroll.reset();
    }

    /// Cancels the active session without committing anything.
    ///
    /// A node move snaps back to its start position; a pan restores the
    /// captured translation; a connection draw discards its transient
    /// elements and restores the prior selection highlight.
    pub fn cancel_drag(&mut self) {
        match self.drag.take() {
            Some(DragSession::NodeMove(drag)) => {
                if let Some(node) = self.scene.nodes.get_mut(&drag.node) {
                    node.position = drag.start_position;
                }
                self.scene.refresh_edges_for(drag.node);
            }
            Some(DragSession::Pan(drag)) => {
                self.viewport.offset = drag.start_offset;
            }
            Some(DragSession::PortDraw(drag)) => {
                self.cleanup_port_drag(&drag);
            }
            None => {}
        }
        self.auto_scroll.reset();
    }

    /// Starts moving the given node.
    ///
    /// Captures the node's current translation as the session baseline and
    /// splits the edges touching it into those terminating here and those
    /// originating here, each with its static endpoint, so only the moving
    /// endpoint needs recomputation per frame. Also selects the node.
    fn start_node_move(&mut self, node_id: NodeId, screen_pos: egui::Pos2) {
        let Some(node) = self.scene.nodes.get(&node_id) else {
            return;
        };
        let start_position = node.position;

        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();
        for (idx, edge) in self.scene.edges.iter().enumerate() {
            if edge.dest_node == node_id {
                incoming.push((idx, edge.start));
            }
            if edge.source_node == node_id {
                outgoing.push((idx, edge.end));
            }
        }

        self.drag = Some(DragSession::NodeMove(NodeMoveDrag {
            node: node_id,
            start_position,
            pointer_start: screen_pos,
            pointer_last: screen_pos,
            incoming,
            outgoing,
            moved: false,
        }));
        self.select_node(node_id);
        log::debug!("node move session started for {node_id}");
    }

    /// Starts panning the canvas, capturing the current translation.
    fn start_pan(&mut self, screen_pos: egui::Pos2) {
        self.drag = Some(DragSession::Pan(PanDrag {
            start_offset: self.viewport.offset,
            pointer_start: screen_pos,
            moved: false,
        }));
    }

    /// Recomputes the dragged node's position and rewrites the affected
    /// edge paths.
    ///
    /// The position is always `start + scaled pointer delta + auto-scroll
    /// accumulator`, never an increment on the previous frame's output, so
    /// pointer moves and scroll ticks cannot double-count.
    pub(crate) fn refresh_node_move(&mut self) {
        let Some(DragSession::NodeMove(drag)) = &self.drag else {
            return;
        };
        let delta =
            (drag.pointer_last - drag.pointer_start) / self.viewport.zoom + self.auto_scroll.accum;
        let node_id = drag.node;
        let new_position = drag.start_position + delta;
        let incoming = drag.incoming.clone();
        let outgoing = drag.outgoing.clone();

        let Some(node) = self.scene.nodes.get_mut(&node_id) else {
            return;
        };
        node.position = new_position;
        let node = node.clone();

        // Moving endpoint from the node's current port geometry, static
        // endpoint from the session snapshot
        for (idx, static_start) in incoming {
            if let Some(edge) = self.scene.edges.get_mut(idx) {
                edge.start = static_start;
                if let Some(pos) = node.port_position(&edge.dest_port) {
                    edge.end = pos;
                }
            }
        }
        for (idx, static_end) in outgoing {
            if let Some(edge) = self.scene.edges.get_mut(idx) {
                edge.end = static_end;
                if let Some(pos) = node.port_position(&edge.source_port) {
                    edge.start = pos;
                }
            }
        }
    }
}
