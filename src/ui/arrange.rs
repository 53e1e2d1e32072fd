//! Automatic layered layout: assigns every connected node a topological
//! depth ("zone") and spreads the zones over the visible canvas as evenly
//! spaced columns.

use super::state::CanvasApp;
use crate::events::{CanvasEvent, ChangeKind};
use crate::model::NodeId;
use eframe::egui;
use std::collections::{BTreeMap, HashMap, HashSet};

impl CanvasApp {
    /// Arranges all connected nodes into a layered grid.
    ///
    /// Computes each node's zone with [`CanvasApp::compute_zones`], groups
    /// the nodes by zone, and spreads the zones over the visible viewport as
    /// evenly spaced columns with evenly spaced rows inside each. Nodes
    /// referenced by a connection but missing from the rendered scene are
    /// reported and skipped; the rest of the arrangement proceeds.
    pub fn auto_arrange(&mut self) {
        if self.model.connections().is_empty() {
            return;
        }
        let zones = self.compute_zones();

        let mut by_zone: BTreeMap<i32, Vec<NodeId>> = BTreeMap::new();
        for (id, zone) in &zones {
            by_zone.entry(*zone).or_default().push(*id);
        }
        for nodes in by_zone.values_mut() {
            nodes.sort_by_key(|id| id.to_string());
        }

        self.emit(CanvasEvent::BeforeChange(ChangeKind::Move));

        // Spread the zone grid over the visible viewport in canvas space
        let area = egui::Rect::from_min_max(
            self.viewport.screen_to_canvas(self.canvas_rect.min),
            self.viewport.screen_to_canvas(self.canvas_rect.max),
        );
        let zone_count = by_zone.len();
        for (col, nodes) in by_zone.values().enumerate() {
            let x = area.min.x + area.width() * (col + 1) as f32 / (zone_count + 1) as f32;
            for (row, id) in nodes.iter().enumerate() {
                let y = area.min.y + area.height() * (row + 1) as f32 / (nodes.len() + 1) as f32;
                if let Some(node) = self.scene.nodes.get_mut(id) {
                    node.position = egui::pos2(x, y);
                    self.model.set_position(*id, (x, y));
                } else {
                    log::error!("auto-arrange: no rendered element for node {id}, skipping");
                }
            }
        }

        self.scene.refresh_all_edges();
    }

    /// Computes the zone (layer index) of every node in the connection list.
    ///
    /// Builds a dependency map — the destination of each connection depends
    /// on its source — and assigns each node `depth - 1` from a recursive
    /// depth trace, so roots land at zone 0. A source whose port id equals
    /// its node id is a workflow input (the model's convention for boundary
    /// roots); any such root that feeds another node is then pinned to
    /// exactly one zone before that consumer, overriding the generic depth,
    /// so workflow inputs stay visually adjacent to their first consumer.
    pub fn compute_zones(&self) -> HashMap<NodeId, i32> {
        let connections = self.model.connections();

        let mut deps: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut roots: HashSet<NodeId> = HashSet::new();
        let mut involved: Vec<NodeId> = Vec::new();
        for conn in connections {
            deps.entry(conn.dest_node).or_default().push(conn.source_node);
            if conn.source_port == conn.source_node.to_string() {
                roots.insert(conn.source_node);
            }
            for id in [conn.source_node, conn.dest_node] {
                if !involved.contains(&id) {
                    involved.push(id);
                }
            }
        }

        let limit = involved.len();
        let mut zones: HashMap<NodeId, i32> = HashMap::new();
        for id in &involved {
            let mut visited = HashSet::new();
            zones.insert(*id, depth_trace(*id, &deps, &mut visited, limit) - 1);
        }

        for conn in connections {
            if roots.contains(&conn.source_node) {
                if let Some(&dest_zone) = zones.get(&conn.dest_node) {
                    zones.insert(conn.source_node, dest_zone - 1);
                }
            }
        }
        zones
    }
}

/// Recursive topological depth of a node: 1 + the deepest not-yet-visited
/// dependency, 1 for a node with no dependencies.
///
/// The visited set is scoped to one trace; a node already on the current
/// trace contributes 0 instead of recursing, which keeps diamonds finite.
/// The trace is additionally bounded by the node count so a true cycle is
/// reported as a defect rather than recursing without end.
fn depth_trace(
    node: NodeId,
    deps: &HashMap<NodeId, Vec<NodeId>>,
    visited: &mut HashSet<NodeId>,
    limit: usize,
) -> i32 {
    if visited.len() > limit {
        log::error!("auto-arrange: dependency trace exceeded node count, treating as cycle");
        return 0;
    }
    visited.insert(node);

    let Some(dependencies) = deps.get(&node).filter(|d| !d.is_empty()) else {
        return 1;
    };
    let deepest = dependencies
        .iter()
        .map(|dep| {
            if visited.contains(dep) {
                0
            } else {
                depth_trace(*dep, deps, visited, limit)
            }
        })
        .max()
        .unwrap_or(0);
    1 + deepest
}
