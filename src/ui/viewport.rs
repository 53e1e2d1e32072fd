//! Viewport transform control: anchored scaling, fit-to-viewport, and
//! scroll-wheel zoom.
//!
//! The transform itself lives in [`super::state::ViewportState`]; this module
//! owns every mutation of it.

use super::state::CanvasApp;
use crate::constants::{FIT_PADDING, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_STEP};
use eframe::egui;
use thiserror::Error;

/// Errors the viewport controller can report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    /// The canvas viewport has no measurable size, so content cannot be
    /// fitted into it.
    #[error("viewport has no measurable size")]
    ViewportUnavailable,
}

impl CanvasApp {
    /// Scales the canvas to the given absolute factor.
    ///
    /// Factors outside the valid zoom band `(0.15, sqrt(3)]` are silently
    /// ignored. When an anchor screen point is given, the canvas-space point
    /// under the anchor stays under it after rescaling; otherwise scaling is
    /// anchored at the origin.
    ///
    /// After an accepted scale the label counter-scale is recomputed as
    /// `1 + (1 - zoom) / (2 * zoom)` so rendered text size stays visually
    /// stable across zoom levels.
    ///
    /// # Arguments
    ///
    /// * `factor` - The absolute target scale
    /// * `anchor` - Optional screen-space point to anchor the scale at
    pub fn scale_to(&mut self, factor: f32, anchor: Option<egui::Pos2>) {
        if !(factor > MIN_ZOOM && factor <= MAX_ZOOM) {
            return;
        }

        if let Some(anchor) = anchor {
            // Keep the canvas point under the anchor stationary across the
            // scale change
            let canvas_before = self.viewport.screen_to_canvas(anchor);
            self.viewport.zoom = factor;
            let screen_after = self.viewport.canvas_to_screen(canvas_before);
            self.viewport.offset += anchor - screen_after;
        } else {
            self.viewport.zoom = factor;
        }

        self.viewport.label_scale = label_counter_scale(factor);
    }

    /// Fits all content into the visible viewport.
    ///
    /// Resets the translation, measures the content bounding box against the
    /// viewport minus a fixed padding, shrinks by the more constraining axis
    /// ratio (capped at 1:1 — fitting never zooms in), and centers the
    /// content. An empty scene resets the transform to identity.
    ///
    /// # Returns
    ///
    /// `Err(CanvasError::ViewportUnavailable)` when the viewport has zero
    /// width or height.
    pub fn fit_to_viewport(&mut self) -> Result<(), CanvasError> {
        let viewport = self.canvas_rect;
        if viewport.width() <= 0.0 || viewport.height() <= 0.0 {
            log::error!("cannot fit content: viewport has no measurable size");
            return Err(CanvasError::ViewportUnavailable);
        }

        self.viewport.offset = egui::Vec2::ZERO;

        let Some(bounds) = self.scene.content_bounds() else {
            self.viewport.zoom = 1.0;
            self.viewport.label_scale = 1.0;
            return Ok(());
        };

        let avail = viewport.shrink(FIT_PADDING);
        let ratio = (avail.width() / bounds.width()).min(avail.height() / bounds.height());
        // Cap at 1:1, and keep the result inside the valid zoom band
        let scale = ratio.clamp(MIN_ZOOM + 0.01, 1.0);

        self.viewport.zoom = scale;
        self.viewport.label_scale = label_counter_scale(scale);

        // Center the content bounding box in the viewport
        let scaled_center = bounds.center().to_vec2() * scale;
        self.viewport.offset = viewport.center().to_vec2() - scaled_center;

        Ok(())
    }

    /// Handles scroll-wheel zooming over the canvas.
    ///
    /// Steps the scale while keeping the hover point fixed in canvas space.
    /// Steps that would leave the valid zoom band are ignored.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_wheel_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }

        let Some(mouse_pos) = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos())
        else {
            return;
        };
        if !response.rect.contains(mouse_pos) {
            return;
        }

        let step = if scroll_delta > 0.0 {
            WHEEL_ZOOM_STEP
        } else {
            -WHEEL_ZOOM_STEP
        };
        self.scale_to(self.viewport.zoom + step, Some(mouse_pos));
    }
}

/// The counter-scale applied to label text at the given zoom.
pub fn label_counter_scale(zoom: f32) -> f32 {
    1.0 + (1.0 - zoom) / (2.0 * zoom)
}
