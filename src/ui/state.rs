//! Application state management structures.
//!
//! This module contains the state structures that track the canvas engine's
//! current condition: the viewport transform, the active drag session, the
//! boundary auto-scroll state, and the selection.

use crate::events::CanvasEvent;
use crate::geometry;
use crate::model::{ModelChange, NodeId, PortId, PortRole, Workflow};
use crate::ui::scene::Scene;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// The canvas pan/zoom transform and display options.
///
/// The transform is the affine matrix `{a (=d) = zoom, e/f = offset}`;
/// `zoom` is kept inside the valid band `(0.15, sqrt(3)]` by
/// [`crate::ui::CanvasApp::scale_to`].
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportState {
    /// Current translation component, in screen pixels
    #[serde(skip)]
    pub offset: egui::Vec2,
    /// Current uniform scale (1.0 = 1:1)
    pub zoom: f32,
    /// Counter-scale applied to label text so it stays legible at any zoom
    pub label_scale: f32,
    /// Whether the background grid should be displayed
    pub show_grid: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom: 1.0,
            label_scale: 1.0,
            show_grid: true,
        }
    }
}

impl ViewportState {
    /// Maps a screen-space point into canvas space using the current transform.
    pub fn screen_to_canvas(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        geometry::screen_to_canvas(screen_pos, self.offset, self.zoom)
    }

    /// Maps a canvas-space point into screen space using the current transform.
    pub fn canvas_to_screen(&self, canvas_pos: egui::Pos2) -> egui::Pos2 {
        geometry::canvas_to_screen(canvas_pos, self.offset, self.zoom)
    }
}

/// Boundary auto-scroll state.
///
/// One owned value, shared by the drag controller and the scroll engine.
/// [`AutoScrollState::reset`] is the single authoritative reset entry point,
/// called on every drag session end; [`AutoScrollState::stop`] halts the
/// repeating action when the pointer re-enters the interior but preserves the
/// offset already contributed to the session's position math.
#[derive(Debug, Default)]
pub struct AutoScrollState {
    /// Boundary classification on the x axis: -1, 0, or +1
    pub boundary_x: i8,
    /// Boundary classification on the y axis: -1, 0, or +1
    pub boundary_y: i8,
    /// Whether the repeating scroll action is active
    pub running: bool,
    /// Input-clock time of the last applied tick, in seconds
    pub last_tick: f64,
    /// Canvas-space offset contributed by auto-scroll during this session
    pub accum: egui::Vec2,
    /// Port highlighted by the scroll tick's own ranking pass, tracked
    /// separately from the pointer-driven highlight
    pub timer_highlight: Option<PortId>,
}

impl AutoScrollState {
    /// Resets everything to defaults. Called on every drag session end.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stops the repeating action and clears the boundary classification.
    ///
    /// The accumulated offset is kept: it has already been folded into the
    /// session's position math and removing it would snap the dragged
    /// element back.
    pub fn stop(&mut self) {
        self.boundary_x = 0;
        self.boundary_y = 0;
        self.running = false;
        self.timer_highlight = None;
    }
}

/// The element currently holding the single selected designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedElement {
    /// A node, by id
    Node(NodeId),
    /// An edge, by index into the scene's edge list
    Edge(usize),
}

/// Tracks the single active selection.
#[derive(Debug, Default)]
pub struct SelectionState {
    /// The selected element, if any
    pub selected: Option<SelectedElement>,
}

/// A snapshotted connection target captured at port-drag start.
#[derive(Debug, Clone)]
pub struct CandidatePort {
    /// Node owning the candidate port
    pub node: NodeId,
    /// The candidate port
    pub port: PortId,
    /// Precomputed canvas-space position of the port
    pub pos: egui::Pos2,
    /// Whether the data model reports this port as a legal target
    pub preferred: bool,
}

/// The transient new-node indicator shown during a port drag.
#[derive(Debug, Clone, Copy)]
pub struct GhostIndicator {
    /// Canvas-space position of the indicator
    pub pos: egui::Pos2,
    /// Whether the indicator is currently shown
    pub visible: bool,
}

/// State owned by an active node-move drag.
#[derive(Debug)]
pub struct NodeMoveDrag {
    /// The node being moved
    pub node: NodeId,
    /// The node's translation when the drag started
    pub start_position: egui::Pos2,
    /// Screen position of the pointer at drag start
    pub pointer_start: egui::Pos2,
    /// Most recent screen position of the pointer
    pub pointer_last: egui::Pos2,
    /// Edges terminating at this node: (edge index, static source endpoint)
    pub incoming: Vec<(usize, egui::Pos2)>,
    /// Edges originating at this node: (edge index, static dest endpoint)
    pub outgoing: Vec<(usize, egui::Pos2)>,
    /// Whether the pointer travelled past the click threshold
    pub moved: bool,
}

/// State owned by an active canvas-pan drag.
#[derive(Debug)]
pub struct PanDrag {
    /// The viewport translation when the drag started
    pub start_offset: egui::Vec2,
    /// Screen position of the pointer at drag start
    pub pointer_start: egui::Pos2,
    /// Whether the pointer travelled past the click threshold
    pub moved: bool,
}

/// State owned by an active port-to-port connection drag.
#[derive(Debug)]
pub struct PortDrag {
    /// Node owning the origin port
    pub origin_node: NodeId,
    /// The port the drag started from
    pub origin_port: PortId,
    /// Directional role of the origin port
    pub origin_role: PortRole,
    /// Canvas-space position of the origin port
    pub origin_pos: egui::Pos2,
    /// Canvas-space center of the origin node (ghost-threshold reference)
    pub origin_node_pos: egui::Pos2,
    /// Screen position of the pointer at drag start
    pub pointer_start: egui::Pos2,
    /// Most recent screen position of the pointer
    pub pointer_last: egui::Pos2,
    /// Canvas-space position of the in-progress edge's free end
    pub free_end: egui::Pos2,
    /// Snapshot of every opposite-role port on other nodes
    pub candidates: Vec<CandidatePort>,
    /// Index of the currently highlighted candidate, if any
    pub highlighted: Option<usize>,
    /// The ghost new-node indicator, owned by this session
    pub ghost: GhostIndicator,
    /// Selection active before the drag began, restored afterwards
    pub prior_selection: Option<SelectedElement>,
}

/// The three mutually-exclusive drag kinds.
///
/// At most one session exists at a time (`Option<DragSession>` on the app,
/// `None` meaning idle). Each variant owns all of its transient state,
/// including the port-drag candidate snapshot and ghost indicator, so ending
/// a session destroys them structurally.
#[derive(Debug)]
pub enum DragSession {
    /// A node is being moved
    NodeMove(NodeMoveDrag),
    /// The canvas is being panned
    Pan(PanDrag),
    /// A connection is being drawn from a port
    PortDraw(PortDrag),
}

/// The main application structure: the workflow model, the rendered scene
/// mirroring it, and all interaction state.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasApp {
    /// The workflow being edited
    pub model: Workflow,
    /// Rendered node/edge elements mirroring the model
    #[serde(skip)]
    pub scene: Scene,
    /// Canvas transform and display state
    pub viewport: ViewportState,
    /// Active drag session, if any
    #[serde(skip)]
    pub drag: Option<DragSession>,
    /// Boundary auto-scroll state
    #[serde(skip)]
    pub auto_scroll: AutoScrollState,
    /// Current selection
    #[serde(skip)]
    pub selection: SelectionState,
    /// Screen rectangle of the canvas region, captured each frame
    #[serde(skip, default = "default_canvas_rect")]
    pub canvas_rect: egui::Rect,
    /// Sender half of the outgoing event channel
    #[serde(skip)]
    pub events_tx: Option<Sender<CanvasEvent>>,
    /// Receiver half of the outgoing event channel, until taken by a caller
    #[serde(skip)]
    pub events_rx: Option<Receiver<CanvasEvent>>,
    /// Receiver for model change notifications (label edits)
    #[serde(skip)]
    pub model_changes: Option<Receiver<ModelChange>>,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Frame counter, drives repaint-dependent effects
    #[serde(skip)]
    pub frame_counter: u64,
}

fn default_canvas_rect() -> egui::Rect {
    egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1200.0, 800.0))
}

impl Default for CanvasApp {
    fn default() -> Self {
        let (sender, receiver) = channel();
        let mut model = Workflow::new();
        let model_changes = model.take_change_receiver();
        Self {
            model,
            scene: Scene::default(),
            viewport: ViewportState::default(),
            drag: None,
            auto_scroll: AutoScrollState::default(),
            selection: SelectionState::default(),
            canvas_rect: default_canvas_rect(),
            events_tx: Some(sender),
            events_rx: Some(receiver),
            model_changes,
            dark_mode: true,
            frame_counter: 0,
        }
    }
}

impl CanvasApp {
    /// Creates an app editing the given workflow.
    pub fn with_model(mut model: Workflow) -> Self {
        let model_changes = model.take_change_receiver();
        let mut app = Self {
            model,
            model_changes,
            ..Default::default()
        };
        app.render();
        app
    }

    /// Takes the receiver half of the event channel.
    ///
    /// # Returns
    ///
    /// The receiver on the first call, `None` afterwards.
    pub fn take_event_receiver(&mut self) -> Option<Receiver<CanvasEvent>> {
        self.events_rx.take()
    }

    /// Emits an event to the external listener, if any is still connected.
    pub(crate) fn emit(&self, event: CanvasEvent) {
        if let Some(sender) = &self.events_tx {
            let _ = sender.send(event);
        }
    }
}
