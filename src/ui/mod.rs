//! User interface root: module wiring, the eframe frame loop, toolbar, and
//! the command surface external callers drive the canvas with.

mod arrange;
mod autoscroll;
mod connect;
mod drag;
mod rendering;
pub mod scene;
mod selection;
pub mod state;
mod viewport;

#[cfg(test)]
mod tests;

pub use state::CanvasApp;
pub use viewport::CanvasError;

use crate::model::ModelChange;
use crate::ui::scene::Scene;
use crate::ui::state::{DragSession, SelectedElement, SelectionState};
use eframe::egui;

impl CanvasApp {
    /// Performs a full re-render: rebuilds the scene from the model's
    /// current snapshot.
    ///
    /// Selection does not survive the rebuild unless the same identifier
    /// still exists, in which case it is reactivated (a selected edge is
    /// matched by its port pair).
    pub fn render(&mut self) {
        let selected_node = match self.selection.selected {
            Some(SelectedElement::Node(id)) => Some(id),
            _ => None,
        };
        let selected_edge = match self.selection.selected {
            Some(SelectedElement::Edge(index)) => self
                .scene
                .edges
                .get(index)
                .map(|e| (e.source_port.clone(), e.dest_port.clone())),
            _ => None,
        };

        self.scene = Scene::build(&self.model);

        self.selection.selected = None;
        if let Some(id) = selected_node {
            if self.scene.nodes.contains_key(&id) {
                self.selection.selected = Some(SelectedElement::Node(id));
            }
        } else if let Some((source, dest)) = selected_edge {
            if let Some(index) = self
                .scene
                .edges
                .iter()
                .position(|e| e.source_port == source && e.dest_port == dest)
            {
                self.selection.selected = Some(SelectedElement::Edge(index));
            }
        }
        self.reapply_selection_highlight();
    }

    /// Tears the canvas down: cancels any session, clears the scene and
    /// selection, and detaches the notification channels.
    pub fn teardown(&mut self) {
        self.drag = None;
        self.auto_scroll.reset();
        self.selection = SelectionState::default();
        self.scene = Scene::default();
        self.model_changes = None;
        self.events_tx = None;
    }

    /// Applies pending model change notifications, patching rendered labels
    /// in place without a full re-render.
    pub fn drain_model_changes(&mut self) {
        let Some(receiver) = &self.model_changes else {
            return;
        };
        let changes: Vec<ModelChange> = receiver.try_iter().collect();
        for ModelChange::LabelChanged { id, label } in changes {
            if let Some(node) = self.scene.nodes.get_mut(&id) {
                node.label = label;
            }
        }
    }

    /// Handles canvas keyboard shortcuts: Delete/Backspace removes the
    /// selection, Escape cancels an in-progress drag.
    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let delete = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if delete {
            self.delete_selection();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) && self.drag.is_some() {
            self.cancel_drag();
        }
    }

    /// Draws the canvas region and routes pointer input through the drag
    /// session controller and the boundary auto-scroll engine.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.canvas_rect = response.rect;

        self.handle_wheel_zoom(ui, &response);

        let pointer_pos = response
            .interact_pointer_pos()
            .or_else(|| ui.input(|i| i.pointer.hover_pos()));
        let primary_pressed = ui.input(|i| i.pointer.primary_pressed());
        let middle_pressed = ui.input(|i| i.pointer.button_pressed(egui::PointerButton::Middle));
        let any_down = ui.input(|i| i.pointer.primary_down() || i.pointer.middle_down());
        let now = ui.input(|i| i.time);

        if let Some(pos) = pointer_pos {
            if self.drag.is_none() {
                if (primary_pressed || middle_pressed) && response.rect.contains(pos) {
                    self.begin_drag(pos, middle_pressed);
                }
            } else if any_down {
                self.update_drag(pos);
            }
        }
        // Pointer-up ends the session even when it happens off-canvas
        if self.drag.is_some() && !any_down {
            self.end_drag();
        }

        if self.drag.is_some() {
            if let Some(pos) = pointer_pos {
                self.update_auto_scroll(pos, now);
            }
            self.drive_auto_scroll(now);
            if self.auto_scroll.running {
                ui.ctx().request_repaint();
            }
        }

        // Mouse-over raises the hovered node, unless a connection is being
        // drawn
        if !matches!(self.drag, Some(DragSession::PortDraw(_))) {
            if let Some(pos) = ui.input(|i| i.pointer.hover_pos()) {
                if response.rect.contains(pos) {
                    let canvas_pos = self.viewport.screen_to_canvas(pos);
                    if let Some(id) = self.scene.node_at(canvas_pos) {
                        self.scene.raise(id);
                    }
                }
            }
        }

        self.render_scene(&painter, response.rect);
    }

    /// Draws the toolbar: fit, arrange, zoom controls, and display toggles.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Fit").clicked() {
                if let Err(err) = self.fit_to_viewport() {
                    log::error!("fit to viewport failed: {err}");
                }
            }
            if ui.button("Arrange").clicked() {
                self.auto_arrange();
            }
            ui.separator();
            if ui.button("\u{2212}").clicked() {
                self.scale_to(self.viewport.zoom - 0.1, None);
            }
            ui.label(format!("{:.0}%", self.viewport.zoom * 100.0));
            if ui.button("+").clicked() {
                self.scale_to(self.viewport.zoom + 0.1, None);
            }
            ui.separator();
            ui.checkbox(&mut self.viewport.show_grid, "Grid");
            ui.checkbox(&mut self.dark_mode, "Dark mode");
        });
    }
}

impl eframe::App for CanvasApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.frame_counter += 1;
        if self.frame_counter == 1 {
            // First frame after construction or state restore: mirror the
            // model into the scene
            self.render();
        }

        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        self.drain_model_changes();
        self.handle_keyboard(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}
