//! Canvas painting: grid background, edges with direction arrows, nodes with
//! their ports, the in-progress connection, and the ghost new-node
//! indicator.

use super::scene::{CanvasEdge, CanvasNode, NodeKind};
use super::state::{CanvasApp, DragSession, SelectedElement};
use crate::constants::{GRID_SIZE, IO_NODE_SIZE, LABEL_FONT_SIZE, NODE_CORNER_RADIUS, PORT_RADIUS};
use eframe::egui;
use eframe::epaint::StrokeKind;

impl CanvasApp {
    /// Renders all canvas elements in layers: grid, edges, the in-progress
    /// connection, nodes in paint order, and the ghost indicator on top.
    pub fn render_scene(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        if self.viewport.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        for (index, edge) in self.scene.edges.iter().enumerate() {
            let is_selected = self.selection.selected == Some(SelectedElement::Edge(index));
            self.draw_edge(painter, edge, is_selected);
        }

        if let Some(DragSession::PortDraw(drag)) = &self.drag {
            let from = self.viewport.canvas_to_screen(drag.origin_pos);
            let to = self.viewport.canvas_to_screen(drag.free_end);
            let color = egui::Color32::from_rgb(100, 150, 255);
            painter.line_segment([from, to], egui::Stroke::new(2.0, color));
            painter.circle_filled(to, 4.0, color);
        }

        for id in &self.scene.order {
            if let Some(node) = self.scene.nodes.get(id) {
                self.draw_node(painter, node);
            }
        }

        if let Some(DragSession::PortDraw(drag)) = &self.drag {
            if drag.ghost.visible {
                self.draw_ghost(painter, drag.ghost.pos);
            }
        }
    }

    /// Draws a zoom-aware grid on the canvas for visual reference.
    ///
    /// Grid lines are drawn every 20 canvas units and skipped entirely when
    /// the zoomed spacing would be too small to see.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let grid_color = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32);
        let stroke = egui::Stroke::new(1.0, grid_color);

        let screen_grid_size = GRID_SIZE * self.viewport.zoom;
        if screen_grid_size < 2.0 {
            return;
        }

        let top_left = self.viewport.screen_to_canvas(canvas_rect.min);
        let bottom_right = self.viewport.screen_to_canvas(canvas_rect.max);
        let start_x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        let end_x = (bottom_right.x / GRID_SIZE).ceil() * GRID_SIZE;
        let start_y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        let end_y = (bottom_right.y / GRID_SIZE).ceil() * GRID_SIZE;

        let mut x = start_x;
        while x <= end_x {
            let screen_x = self.viewport.canvas_to_screen(egui::pos2(x, 0.0)).x;
            if screen_x >= canvas_rect.min.x && screen_x <= canvas_rect.max.x {
                painter.line_segment(
                    [
                        egui::pos2(screen_x, canvas_rect.min.y),
                        egui::pos2(screen_x, canvas_rect.max.y),
                    ],
                    stroke,
                );
            }
            x += GRID_SIZE;
        }

        let mut y = start_y;
        while y <= end_y {
            let screen_y = self.viewport.canvas_to_screen(egui::pos2(0.0, y)).y;
            if screen_y >= canvas_rect.min.y && screen_y <= canvas_rect.max.y {
                painter.line_segment(
                    [
                        egui::pos2(canvas_rect.min.x, screen_y),
                        egui::pos2(canvas_rect.max.x, screen_y),
                    ],
                    stroke,
                );
            }
            y += GRID_SIZE;
        }
    }

    /// Renders an edge as a wide hit-friendly underlay plus the visible core
    /// line, with a directional arrow at the center. Both strokes share the
    /// same endpoints, so they stay in sync by construction.
    fn draw_edge(&self, painter: &egui::Painter, edge: &CanvasEdge, is_selected: bool) {
        let start = self.viewport.canvas_to_screen(edge.start);
        let end = self.viewport.canvas_to_screen(edge.end);

        let (color, width) = if is_selected {
            (egui::Color32::from_rgb(100, 150, 255), 3.0)
        } else if edge.highlighted {
            (egui::Color32::from_rgb(255, 200, 80), 2.5)
        } else {
            (egui::Color32::DARK_GRAY, 2.0)
        };

        let underlay = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 24);
        painter.line_segment([start, end], egui::Stroke::new(width + 6.0, underlay));
        painter.line_segment([start, end], egui::Stroke::new(width, color));

        self.draw_arrow_at_center(painter, start, end, color);
    }

    /// Draws a filled triangle at the center of an edge, pointing from
    /// source to destination. Size scales with zoom.
    fn draw_arrow_at_center(
        &self,
        painter: &egui::Painter,
        start: egui::Pos2,
        end: egui::Pos2,
        color: egui::Color32,
    ) {
        let center = start + (end - start) * 0.5;
        let direction = (end - start).normalized();
        let arrow_size = 8.0 * self.viewport.zoom;
        let arrow_width = 6.0 * self.viewport.zoom;
        let perpendicular = egui::vec2(-direction.y, direction.x);

        let tip = center + direction * arrow_size;
        let left = center - direction * arrow_size + perpendicular * arrow_width;
        let right = center - direction * arrow_size - perpendicular * arrow_width;

        painter.add(egui::Shape::convex_polygon(
            vec![tip, left, right],
            color,
            egui::Stroke::NONE,
        ));
    }

    /// Renders a node with its ports and label.
    ///
    /// Steps are blue, workflow inputs green, outputs red. The selected node
    /// gets a yellow border, highlighted neighbors an amber one, and nodes
    /// owning preferred connection targets a green emphasis while a port
    /// drag is active.
    fn draw_node(&self, painter: &egui::Painter, node: &CanvasNode) {
        let rect = node.rect();
        let screen_rect = egui::Rect::from_min_max(
            self.viewport.canvas_to_screen(rect.min),
            self.viewport.canvas_to_screen(rect.max),
        );

        let fill = match node.kind {
            NodeKind::Step => egui::Color32::LIGHT_BLUE,
            NodeKind::Input => egui::Color32::LIGHT_GREEN,
            NodeKind::Output => egui::Color32::LIGHT_RED,
        };

        let is_selected = self.selection.selected == Some(SelectedElement::Node(node.id));
        let (stroke_color, stroke_width) = if is_selected {
            (egui::Color32::YELLOW, 3.0)
        } else if node.highlighted {
            (egui::Color32::from_rgb(255, 200, 80), 3.0)
        } else if node.preferred {
            (egui::Color32::from_rgb(80, 200, 120), 2.5)
        } else {
            (egui::Color32::BLACK, 2.0)
        };

        painter.rect_filled(screen_rect, NODE_CORNER_RADIUS, fill);
        painter.rect_stroke(
            screen_rect,
            NODE_CORNER_RADIUS,
            egui::Stroke::new(stroke_width, stroke_color),
            StrokeKind::Outside,
        );

        for (port, _, pos) in node.ports() {
            let screen_pos = self.viewport.canvas_to_screen(pos);
            let radius = PORT_RADIUS * self.viewport.zoom;
            let highlighted = self.scene.highlighted_ports.iter().any(|p| p == port);
            let port_fill = if highlighted {
                egui::Color32::from_rgb(100, 150, 255)
            } else if node.preferred {
                egui::Color32::from_rgb(80, 200, 120)
            } else {
                egui::Color32::GRAY
            };
            painter.circle_filled(screen_pos, radius, port_fill);
            painter.circle_stroke(
                screen_pos,
                radius,
                egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            );
        }

        self.draw_node_label(painter, node, screen_rect);
    }

    /// Renders the node's label, counter-scaled so text stays legible across
    /// zoom levels.
    fn draw_node_label(&self, painter: &egui::Painter, node: &CanvasNode, rect: egui::Rect) {
        let size = LABEL_FONT_SIZE * self.viewport.zoom * self.viewport.label_scale;
        let font = egui::FontId::proportional(size.clamp(8.0, 48.0));
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            &node.label,
            font,
            egui::Color32::BLACK,
        );
    }

    /// Draws the ghost new-node indicator: a dashed rectangle at the drag's
    /// free end signaling that releasing here spawns a new input/output.
    fn draw_ghost(&self, painter: &egui::Painter, pos: egui::Pos2) {
        let rect = egui::Rect::from_center_size(pos, egui::vec2(IO_NODE_SIZE, IO_NODE_SIZE));
        let screen_rect = egui::Rect::from_min_max(
            self.viewport.canvas_to_screen(rect.min),
            self.viewport.canvas_to_screen(rect.max),
        );
        let color = egui::Color32::from_rgba_unmultiplied(100, 150, 255, 180);
        let stroke = egui::Stroke::new(1.5, color);

        let corners = [
            screen_rect.left_top(),
            screen_rect.right_top(),
            screen_rect.right_bottom(),
            screen_rect.left_bottom(),
        ];
        for i in 0..4 {
            let shapes =
                egui::Shape::dashed_line(&[corners[i], corners[(i + 1) % 4]], stroke, 6.0, 4.0);
            for shape in shapes {
                painter.add(shape);
            }
        }
    }
}
