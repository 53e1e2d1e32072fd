//! Pure coordinate math shared by the viewport, drag, and connection code.
//!
//! The canvas transform is a uniform-scale affine matrix `{a (=d), e, f}`:
//! `screen = canvas * zoom + offset`. Everything here is stateless; the
//! owning [`crate::ui::state::ViewportState`] holds the actual matrix.

use eframe::egui;

/// Converts a screen-space point to canvas-space by inverting the transform.
///
/// # Arguments
///
/// * `screen_pos` - Position in screen space (pixels)
/// * `offset` - Current translation component of the transform
/// * `zoom` - Current uniform scale component of the transform
///
/// # Returns
///
/// The corresponding position in canvas space
pub fn screen_to_canvas(screen_pos: egui::Pos2, offset: egui::Vec2, zoom: f32) -> egui::Pos2 {
    (screen_pos - offset) / zoom
}

/// Converts a canvas-space point to screen-space by applying the transform.
///
/// # Arguments
///
/// * `canvas_pos` - Position in canvas space
/// * `offset` - Current translation component of the transform
/// * `zoom` - Current uniform scale component of the transform
///
/// # Returns
///
/// The corresponding position in screen space (pixels)
pub fn canvas_to_screen(canvas_pos: egui::Pos2, offset: egui::Vec2, zoom: f32) -> egui::Pos2 {
    canvas_pos * zoom + offset
}

/// Straight-line distance between two points.
pub fn distance(a: egui::Pos2, b: egui::Pos2) -> f32 {
    (b - a).length()
}

/// Calculates the distance from a point to a line segment.
///
/// Uses vector projection to find the closest point on the line segment.
///
/// # Arguments
///
/// * `point` - The point to measure from
/// * `line_start` - Start of the line segment
/// * `line_end` - End of the line segment
///
/// # Returns
///
/// The minimum distance from the point to the line segment
pub fn segment_distance(point: egui::Pos2, line_start: egui::Pos2, line_end: egui::Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;
    let line_len_sq = line_vec.length_sq();

    if line_len_sq < 0.0001 {
        // Line segment is essentially a point
        return point_vec.length();
    }

    // Project point onto line segment (clamped to segment endpoints)
    let t = (point_vec.dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    let projection = line_start + line_vec * t;

    (point - projection).length()
}
