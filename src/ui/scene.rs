//! Rendered node and edge elements mirroring the workflow model.
//!
//! The scene is the retained visual layer the drag, connection, and arrange
//! code mutate. It is rebuilt from the model on every full re-render and
//! destroyed on teardown; positions committed back into the model survive
//! the rebuild.

use crate::constants::{
    CLICK_THRESHOLD, IO_NODE_SIZE, NODE_HEIGHT, NODE_WIDTH, PORT_HIT_RADIUS,
};
use crate::geometry;
use crate::model::{NodeId, PortId, PortRole, Workflow};
use eframe::egui;
use std::collections::HashMap;

/// Which kind of workflow node a scene node renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A processing step
    Step,
    /// A workflow input (graph root)
    Input,
    /// A workflow output (graph sink)
    Output,
}

/// A rendered node element.
#[derive(Debug, Clone)]
pub struct CanvasNode {
    /// Identifier of the domain object this node mirrors
    pub id: NodeId,
    /// The kind of node
    pub kind: NodeKind,
    /// Center position in canvas units (the node's own translation)
    pub position: egui::Pos2,
    /// Display label
    pub label: String,
    /// Input-role port ids, top to bottom along the left edge
    pub in_ports: Vec<PortId>,
    /// Output-role port ids, top to bottom along the right edge
    pub out_ports: Vec<PortId>,
    /// Whether the node is highlighted as part of the selection neighborhood
    pub highlighted: bool,
    /// Whether the node owns a preferred connection target during a port drag
    pub preferred: bool,
}

impl CanvasNode {
    /// The node's size in canvas units.
    pub fn size(&self) -> egui::Vec2 {
        match self.kind {
            NodeKind::Step => egui::vec2(NODE_WIDTH, NODE_HEIGHT),
            NodeKind::Input | NodeKind::Output => egui::vec2(IO_NODE_SIZE, IO_NODE_SIZE),
        }
    }

    /// The node's bounding rectangle in canvas units.
    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_center_size(self.position, self.size())
    }

    /// Canvas-space position of the given port on this node.
    ///
    /// Input ports sit on the left edge, output ports on the right, evenly
    /// spaced top to bottom.
    ///
    /// # Returns
    ///
    /// The port's position, or `None` if the node has no such port.
    pub fn port_position(&self, port: &str) -> Option<egui::Pos2> {
        let rect = self.rect();
        if let Some(i) = self.in_ports.iter().position(|p| p == port) {
            let slot = (i + 1) as f32 / (self.in_ports.len() + 1) as f32;
            return Some(egui::pos2(rect.left(), rect.top() + rect.height() * slot));
        }
        if let Some(i) = self.out_ports.iter().position(|p| p == port) {
            let slot = (i + 1) as f32 / (self.out_ports.len() + 1) as f32;
            return Some(egui::pos2(rect.right(), rect.top() + rect.height() * slot));
        }
        None
    }

    /// Iterates over all ports with their roles and positions.
    pub fn ports(&self) -> impl Iterator<Item = (&PortId, PortRole, egui::Pos2)> + '_ {
        let rect = self.rect();
        let ins = self.in_ports.iter().enumerate().map(move |(i, p)| {
            let slot = (i + 1) as f32 / (self.in_ports.len() + 1) as f32;
            (
                p,
                PortRole::Input,
                egui::pos2(rect.left(), rect.top() + rect.height() * slot),
            )
        });
        let outs = self.out_ports.iter().enumerate().map(move |(i, p)| {
            let slot = (i + 1) as f32 / (self.out_ports.len() + 1) as f32;
            (
                p,
                PortRole::Output,
                egui::pos2(rect.right(), rect.top() + rect.height() * slot),
            )
        });
        ins.chain(outs)
    }
}

/// A rendered edge element between two ports.
///
/// Endpoint geometry is retained so a node move rewrites only the moving
/// endpoint; the static endpoint comes from the drag session's snapshot.
#[derive(Debug, Clone)]
pub struct CanvasEdge {
    /// Node owning the source port
    pub source_node: NodeId,
    /// Port the edge originates from
    pub source_port: PortId,
    /// Node owning the destination port
    pub dest_node: NodeId,
    /// Port the edge terminates at
    pub dest_port: PortId,
    /// Canvas-space position of the source endpoint
    pub start: egui::Pos2,
    /// Canvas-space position of the destination endpoint
    pub end: egui::Pos2,
    /// Whether the edge is highlighted as part of the selection neighborhood
    pub highlighted: bool,
}

/// The retained rendered scene: nodes in paint order plus edges.
#[derive(Default)]
pub struct Scene {
    /// All rendered nodes, by id
    pub nodes: HashMap<NodeId, CanvasNode>,
    /// Paint order; the last entry is drawn frontmost
    pub order: Vec<NodeId>,
    /// All rendered edges
    pub edges: Vec<CanvasEdge>,
    /// Ports highlighted by the current selection (edge selection)
    pub highlighted_ports: Vec<PortId>,
}

impl Scene {
    /// Builds a scene from the model's current steps, inputs, outputs, and
    /// connections. Nodes without a stored position get staggered defaults.
    pub fn build(model: &Workflow) -> Self {
        let mut scene = Scene::default();

        for (i, input) in model.inputs().iter().filter(|n| n.visible).enumerate() {
            let position = input
                .position
                .map(|(x, y)| egui::pos2(x, y))
                .unwrap_or_else(|| egui::pos2(80.0, 100.0 + 100.0 * i as f32));
            scene.insert(CanvasNode {
                id: input.id,
                kind: NodeKind::Input,
                position,
                label: "in".to_string(),
                in_ports: Vec::new(),
                out_ports: vec![input.port()],
                highlighted: false,
                preferred: false,
            });
        }

        for (i, step) in model.steps().iter().filter(|n| n.visible).enumerate() {
            let position = step
                .position
                .map(|(x, y)| egui::pos2(x, y))
                .unwrap_or_else(|| {
                    egui::pos2(
                        260.0 + 180.0 * (i % 4) as f32,
                        120.0 + 140.0 * (i / 4) as f32,
                    )
                });
            scene.insert(CanvasNode {
                id: step.id,
                kind: NodeKind::Step,
                position,
                label: step.label.clone(),
                in_ports: step.inputs.iter().map(|n| step.input_port(n)).collect(),
                out_ports: step.outputs.iter().map(|n| step.output_port(n)).collect(),
                highlighted: false,
                preferred: false,
            });
        }

        for (i, output) in model.outputs().iter().filter(|n| n.visible).enumerate() {
            let position = output
                .position
                .map(|(x, y)| egui::pos2(x, y))
                .unwrap_or_else(|| egui::pos2(960.0, 100.0 + 100.0 * i as f32));
            scene.insert(CanvasNode {
                id: output.id,
                kind: NodeKind::Output,
                position,
                label: "out".to_string(),
                in_ports: vec![output.port()],
                out_ports: Vec::new(),
                highlighted: false,
                preferred: false,
            });
        }

        for conn in model.connections() {
            scene.add_edge(
                conn.source_node,
                conn.source_port.clone(),
                conn.dest_node,
                conn.dest_port.clone(),
            );
        }

        scene
    }

    fn insert(&mut self, node: CanvasNode) {
        self.order.push(node.id);
        self.nodes.insert(node.id, node);
    }

    /// Adds an edge between two ports, computing its endpoint geometry.
    ///
    /// Edges referencing a node missing from the scene are skipped.
    pub fn add_edge(
        &mut self,
        source_node: NodeId,
        source_port: PortId,
        dest_node: NodeId,
        dest_port: PortId,
    ) {
        let (Some(source), Some(dest)) = (self.nodes.get(&source_node), self.nodes.get(&dest_node))
        else {
            return;
        };
        let start = source
            .port_position(&source_port)
            .unwrap_or(source.position);
        let end = dest.port_position(&dest_port).unwrap_or(dest.position);
        self.edges.push(CanvasEdge {
            source_node,
            source_port,
            dest_node,
            dest_port,
            start,
            end,
            highlighted: false,
        });
    }

    /// Finds the topmost node whose rectangle contains the given canvas point.
    pub fn node_at(&self, pos: egui::Pos2) -> Option<NodeId> {
        self.order
            .iter()
            .rev()
            .find(|id| {
                self.nodes
                    .get(*id)
                    .is_some_and(|node| node.rect().contains(pos))
            })
            .copied()
    }

    /// Finds the topmost port within the hit radius of the given canvas point.
    ///
    /// # Returns
    ///
    /// The owning node, the port id, and the port's role.
    pub fn port_at(&self, pos: egui::Pos2) -> Option<(NodeId, PortId, PortRole)> {
        for id in self.order.iter().rev() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            for (port, role, port_pos) in node.ports() {
                if geometry::distance(pos, port_pos) <= PORT_HIT_RADIUS {
                    return Some((*id, port.clone(), role));
                }
            }
        }
        None
    }

    /// Finds the first edge within the click threshold of the given canvas
    /// point.
    pub fn edge_at(&self, pos: egui::Pos2) -> Option<usize> {
        self.edges
            .iter()
            .position(|edge| geometry::segment_distance(pos, edge.start, edge.end) < CLICK_THRESHOLD)
    }

    /// Brings a node to the front of the paint order.
    pub fn raise(&mut self, id: NodeId) {
        if let Some(pos) = self.order.iter().position(|n| *n == id) {
            if pos != self.order.len() - 1 {
                self.order.remove(pos);
                self.order.push(id);
            }
        }
    }

    /// Recomputes the endpoints of every edge touching the given node.
    pub fn refresh_edges_for(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let node = node.clone();
        for edge in &mut self.edges {
            if edge.source_node == id {
                if let Some(pos) = node.port_position(&edge.source_port) {
                    edge.start = pos;
                }
            }
            if edge.dest_node == id {
                if let Some(pos) = node.port_position(&edge.dest_port) {
                    edge.end = pos;
                }
            }
        }
    }

    /// Recomputes the endpoints of every edge from current node geometry.
    pub fn refresh_all_edges(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.refresh_edges_for(id);
        }
    }

    /// Clears every highlight and preference flag in one pass.
    pub fn clear_highlights(&mut self) {
        for node in self.nodes.values_mut() {
            node.highlighted = false;
            node.preferred = false;
        }
        for edge in &mut self.edges {
            edge.highlighted = false;
        }
        self.highlighted_ports.clear();
    }

    /// The union of all node rectangles, in canvas units.
    ///
    /// # Returns
    ///
    /// `None` when the scene is empty.
    pub fn content_bounds(&self) -> Option<egui::Rect> {
        let mut iter = self.nodes.values();
        let first = iter.next()?.rect();
        Some(iter.fold(first, |acc, node| acc.union(node.rect())))
    }
}
