//! Port connection resolution: candidate ranking, snap highlighting, the
//! ghost new-node indicator, and the release rules that turn a port drag
//! into a connection or a freshly spawned input/output.

use super::state::{CandidatePort, CanvasApp, DragSession, GhostIndicator, PortDrag};
use crate::constants::{GHOST_THRESHOLD, SNAP_RADIUS};
use crate::events::{CanvasEvent, ChangeKind};
use crate::geometry;
use crate::model::{NodeId, PortId, PortRole};
use eframe::egui;
use std::cmp::Ordering;
use std::collections::HashSet;

impl CanvasApp {
    /// Starts drawing a connection from the given port.
    ///
    /// Snapshots every opposite-role port on other nodes with its canvas
    /// position, and separately asks the data model which of those are valid
    /// targets for visual emphasis. The valid subset does not narrow the
    /// distance search — any opposite-role port is selectable.
    pub(crate) fn start_port_drag(
        &mut self,
        node_id: NodeId,
        port: PortId,
        role: PortRole,
        screen_pos: egui::Pos2,
    ) {
        let Some(node) = self.scene.nodes.get(&node_id) else {
            return;
        };
        let origin_pos = node.port_position(&port).unwrap_or(node.position);
        let origin_node_pos = node.position;

        let valid: HashSet<PortId> = self
            .model
            .gather_valid_connection_points(&port)
            .into_iter()
            .map(|descriptor| descriptor.port)
            .collect();

        let opposite = role.opposite();
        let mut candidates = Vec::new();
        let mut preferred_nodes = Vec::new();
        for id in &self.scene.order {
            if *id == node_id {
                continue;
            }
            let Some(candidate_node) = self.scene.nodes.get(id) else {
                continue;
            };
            for (candidate_port, candidate_role, pos) in candidate_node.ports() {
                if candidate_role != opposite {
                    continue;
                }
                let preferred = valid.contains(candidate_port);
                if preferred {
                    preferred_nodes.push(*id);
                }
                candidates.push(CandidatePort {
                    node: *id,
                    port: candidate_port.clone(),
                    pos,
                    preferred,
                });
            }
        }

        // Suspend the selection highlight for the duration of the drag and
        // mark the legal targets for visual emphasis
        let prior_selection = self.selection.selected;
        self.scene.clear_highlights();
        for id in preferred_nodes {
            if let Some(n) = self.scene.nodes.get_mut(&id) {
                n.preferred = true;
            }
        }

        self.drag = Some(DragSession::PortDraw(PortDrag {
            origin_node: node_id,
            origin_port: port,
            origin_role: role,
            origin_pos,
            origin_node_pos,
            pointer_start: screen_pos,
            pointer_last: screen_pos,
            free_end: origin_pos,
            candidates,
            highlighted: None,
            ghost: GhostIndicator {
                pos: origin_pos,
                visible: false,
            },
            prior_selection,
        }));
        log::debug!("port draw session started from {node_id}");
    }

    /// Recomputes the in-progress edge's free end from the session baseline
    /// and re-runs the ranking/highlight pass.
    pub(crate) fn refresh_port_drag(&mut self) {
        let zoom = self.viewport.zoom;
        let accum = self.auto_scroll.accum;
        if let Some(DragSession::PortDraw(drag)) = &mut self.drag {
            drag.free_end =
                drag.origin_pos + (drag.pointer_last - drag.pointer_start) / zoom + accum;
        } else {
            return;
        }
        self.update_port_ranking();
    }

    /// Ranks the candidate ports by distance to the free end and decides
    /// between snap highlighting and the ghost indicator.
    ///
    /// The nearest candidate within the snap radius is highlighted (along
    /// with its parent node) and the ghost is hidden. Otherwise the
    /// highlight is cleared, and the ghost is shown only once the free end
    /// has travelled past the ghost threshold from the origin node.
    pub(crate) fn update_port_ranking(&mut self) {
        let Some(DragSession::PortDraw(drag)) = &self.drag else {
            return;
        };
        let free_end = drag.free_end;
        let origin_node_pos = drag.origin_node_pos;

        let nearest = drag
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, geometry::distance(c.pos, free_end)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        let snapped = nearest.filter(|(_, dist)| *dist <= SNAP_RADIUS);
        let target = snapped.map(|(i, _)| {
            let candidate = &drag.candidates[i];
            (i, candidate.node, candidate.port.clone())
        });
        let ghost_visible = target.is_none()
            && geometry::distance(free_end, origin_node_pos) > GHOST_THRESHOLD;

        // Apply the highlight decision to the scene
        for node in self.scene.nodes.values_mut() {
            node.highlighted = false;
        }
        self.scene.highlighted_ports.clear();
        if let Some((_, target_node, target_port)) = &target {
            if let Some(node) = self.scene.nodes.get_mut(target_node) {
                node.highlighted = true;
            }
            self.scene.highlighted_ports.push(target_port.clone());
        }
        if self.auto_scroll.running {
            // The tick's own ranking pass tracks its highlight separately
            // from pointer-driven moves
            self.auto_scroll.timer_highlight =
                target.as_ref().map(|(_, _, port)| port.clone());
        }

        if let Some(DragSession::PortDraw(drag)) = &mut self.drag {
            drag.highlighted = target.map(|(i, _, _)| i);
            drag.ghost.visible = ghost_visible;
            if ghost_visible {
                drag.ghost.pos = free_end;
            }
        }
    }

    /// Applies the release rules for a finished port drag.
    ///
    /// A highlighted port becomes a connection (unless the pair is already
    /// connected — duplicate releases are no-ops); a visible ghost spawns a
    /// new input or output wired to the origin port; a release in dead space
    /// near the origin mutates nothing. All transient markers are removed
    /// and a pre-existing selection gets its highlight back.
    pub(crate) fn release_port_drag(&mut self, drag: PortDrag) {
        if let Some(idx) = drag.highlighted {
            let candidate = &drag.candidates[idx];
            // Normalize direction so the input-side port is always the
            // destination; relies on the `in` id prefix marking that side
            let origin_is_input = drag.origin_port.starts_with("in");
            let (source_node, source_port, dest_node, dest_port) = if origin_is_input {
                (
                    candidate.node,
                    candidate.port.clone(),
                    drag.origin_node,
                    drag.origin_port.clone(),
                )
            } else {
                (
                    drag.origin_node,
                    drag.origin_port.clone(),
                    candidate.node,
                    candidate.port.clone(),
                )
            };

            if !self.model.connected(&source_port, &dest_port) {
                self.emit(CanvasEvent::BeforeChange(ChangeKind::Connect));
                self.scene.add_edge(
                    source_node,
                    source_port.clone(),
                    dest_node,
                    dest_port.clone(),
                );
                match self.model.connect(&source_port, &dest_port) {
                    Ok(()) => self.emit(CanvasEvent::ConnectionCreated {
                        source_node,
                        source_port,
                        dest_node,
                        dest_port,
                    }),
                    Err(err) => log::warn!("connection rejected by model: {err}"),
                }
            }
        } else if drag.ghost.visible {
            let spawn_pos = self.clamp_spawn_position(drag.ghost.pos);
            let is_input = drag.origin_role == PortRole::Input;
            let kind = if is_input {
                ChangeKind::InputCreate
            } else {
                ChangeKind::OutputCreate
            };
            self.emit(CanvasEvent::BeforeChange(kind));
            let created = if is_input {
                self.model.create_input_from_port(&drag.origin_port)
            } else {
                self.model.create_output_from_port(&drag.origin_port)
            };
            match created {
                Ok(id) => {
                    self.model.set_position(id, (spawn_pos.x, spawn_pos.y));
                    self.emit(CanvasEvent::NodeCreated {
                        node: id,
                        is_input,
                    });
                    self.render();
                }
                Err(err) => log::warn!("node spawn rejected by model: {err}"),
            }
        }
        // Release in dead space near the origin: no graph mutation

        self.cleanup_port_drag(&drag);
    }

    /// Removes every transient marker left by a port drag and restores the
    /// prior selection's highlight.
    pub(crate) fn cleanup_port_drag(&mut self, drag: &PortDrag) {
        self.scene.clear_highlights();
        self.selection.selected = drag.prior_selection;
        self.reapply_selection_highlight();
    }

    /// Clamps a canvas-space spawn position so it lands inside the canvas
    /// interior, just clear of the auto-scroll boundary bands.
    fn clamp_spawn_position(&self, canvas_pos: egui::Pos2) -> egui::Pos2 {
        let band = Self::boundary_band_widths(self.canvas_rect);
        let interior = egui::Rect::from_min_max(
            self.canvas_rect.min + band,
            self.canvas_rect.max - band,
        );
        let screen = self.viewport.canvas_to_screen(canvas_pos);
        let clamped = egui::pos2(
            screen.x.clamp(interior.min.x, interior.max.x),
            screen.y.clamp(interior.min.y, interior.max.y),
        );
        self.viewport.screen_to_canvas(clamped)
    }
}
