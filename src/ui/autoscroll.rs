//! Boundary auto-scroll: while a drag pointer sits in a band at the canvas
//! edge, a fixed-cadence repeating action pans the viewport, carries the
//! dragged element along, and keeps the connection resolver's ranking fresh.
//!
//! The engine never moves anything relative to its previous output: every
//! tick folds one step into the session's accumulated offset, and the drag
//! controller recomputes positions from `baseline + pointer delta + offset`.

use super::state::{CanvasApp, DragSession};
use crate::constants::{BOUNDARY_BAND, SCROLL_STEP, SCROLL_TICK};
use eframe::egui;

/// Upper bound on ticks applied in one frame, so a long frame hitch cannot
/// fire an unbounded burst.
const MAX_TICKS_PER_FRAME: u32 = 10;

impl CanvasApp {
    /// Per-axis boundary band width for the given canvas rectangle.
    ///
    /// Starts at the reference width and halves until the two opposing
    /// bands on an axis can no longer overlap, guarding degenerate small
    /// viewports.
    pub(crate) fn boundary_band_widths(rect: egui::Rect) -> egui::Vec2 {
        let mut x = BOUNDARY_BAND;
        while x > rect.width() / 2.0 && x > 1.0 {
            x /= 2.0;
        }
        let mut y = BOUNDARY_BAND;
        while y > rect.height() / 2.0 && y > 1.0 {
            y /= 2.0;
        }
        egui::vec2(x, y)
    }

    /// Classifies the pointer against the boundary bands of the given
    /// rectangle, per axis: -1 before the near edge's band, +1 past the far
    /// edge's band (including beyond the rectangle), 0 in the interior.
    pub(crate) fn classify_boundary(rect: egui::Rect, pointer: egui::Pos2) -> (i8, i8) {
        let band = Self::boundary_band_widths(rect);
        let x = if pointer.x < rect.min.x + band.x {
            -1
        } else if pointer.x > rect.max.x - band.x {
            1
        } else {
            0
        };
        let y = if pointer.y < rect.min.y + band.y {
            -1
        } else if pointer.y > rect.max.y - band.y {
            1
        } else {
            0
        };
        (x, y)
    }

    /// Reclassifies the pointer and starts, retargets, or stops the
    /// repeating scroll action accordingly.
    ///
    /// Only node-move and port-draw sessions scroll; a pan follows the
    /// pointer directly. Re-entering the interior on both axes stops the
    /// action (the session's accumulated offset is preserved — see
    /// [`super::state::AutoScrollState::stop`]).
    ///
    /// # Arguments
    ///
    /// * `pointer` - Current pointer position in screen space
    /// * `now` - Input-clock time in seconds
    pub fn update_auto_scroll(&mut self, pointer: egui::Pos2, now: f64) {
        let eligible = matches!(
            self.drag,
            Some(DragSession::NodeMove(_)) | Some(DragSession::PortDraw(_))
        );
        if !eligible {
            return;
        }

        let (x, y) = Self::classify_boundary(self.canvas_rect, pointer);
        if x == 0 && y == 0 {
            if self.auto_scroll.running {
                self.auto_scroll.stop();
            }
            return;
        }

        if !self.auto_scroll.running {
            self.auto_scroll.running = true;
            self.auto_scroll.last_tick = now;
            log::debug!("auto-scroll started (x: {x}, y: {y})");
        }
        self.auto_scroll.boundary_x = x;
        self.auto_scroll.boundary_y = y;
    }

    /// Applies every tick that has come due since the last frame.
    ///
    /// # Arguments
    ///
    /// * `now` - Input-clock time in seconds
    pub fn drive_auto_scroll(&mut self, now: f64) {
        let mut fired = 0;
        while self.auto_scroll.running
            && now - self.auto_scroll.last_tick >= SCROLL_TICK
            && fired < MAX_TICKS_PER_FRAME
        {
            self.auto_scroll.last_tick += SCROLL_TICK;
            self.auto_scroll_tick();
            fired += 1;
        }
        if fired == MAX_TICKS_PER_FRAME {
            // Drop the backlog rather than bursting to catch up
            self.auto_scroll.last_tick = now;
        }
    }

    /// Applies one auto-scroll step.
    ///
    /// Pans the viewport one fixed step opposite the boundary direction,
    /// folds the step (scaled into canvas space) into the session's
    /// accumulated offset, and refreshes the dragged element: a moved node
    /// gets its edges rewritten, an in-progress connection gets its free end
    /// and candidate ranking recomputed — so scrolling alone can bring a new
    /// port into highlight range.
    pub fn auto_scroll_tick(&mut self) {
        if !self.auto_scroll.running {
            return;
        }
        let dir = egui::vec2(
            self.auto_scroll.boundary_x as f32,
            self.auto_scroll.boundary_y as f32,
        );
        self.viewport.offset -= dir * SCROLL_STEP;
        self.auto_scroll.accum += dir * SCROLL_STEP / self.viewport.zoom;

        match &self.drag {
            Some(DragSession::NodeMove(_)) => self.refresh_node_move(),
            Some(DragSession::PortDraw(_)) => self.refresh_port_drag(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2, Rect};

    #[test]
    fn band_width_halves_for_small_viewports() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        assert_eq!(CanvasApp::boundary_band_widths(rect), vec2(40.0, 40.0));

        // A 50px-wide canvas cannot host two 40px bands
        let narrow = Rect::from_min_size(pos2(0.0, 0.0), vec2(50.0, 600.0));
        let band = CanvasApp::boundary_band_widths(narrow);
        assert!(band.x <= 25.0);
        assert_eq!(band.y, 40.0);
    }

    #[test]
    fn boundary_classification_per_axis() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));

        assert_eq!(CanvasApp::classify_boundary(rect, pos2(400.0, 300.0)), (0, 0));
        assert_eq!(CanvasApp::classify_boundary(rect, pos2(10.0, 300.0)), (-1, 0));
        assert_eq!(CanvasApp::classify_boundary(rect, pos2(795.0, 300.0)), (1, 0));
        assert_eq!(CanvasApp::classify_boundary(rect, pos2(400.0, 5.0)), (0, -1));
        assert_eq!(CanvasApp::classify_boundary(rect, pos2(400.0, 599.0)), (0, 1));
        // Past the far edge still counts as +1
        assert_eq!(CanvasApp::classify_boundary(rect, pos2(900.0, -50.0)), (1, -1));
    }
}
