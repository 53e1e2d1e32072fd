//! Shared application-wide constants.
//! Centralizes tweakable values used across UI rendering and interactions.

// Zoom
/// Lower bound of the valid zoom band (exclusive). Scale requests at or below
/// this are ignored.
pub const MIN_ZOOM: f32 = 0.15;
/// Upper bound of the valid zoom band (inclusive), sqrt(3).
pub const MAX_ZOOM: f32 = 1.732_050_8;
/// Zoom step applied per scroll-wheel notch.
pub const WHEEL_ZOOM_STEP: f32 = 0.025;

// Node dimensions
/// Default step-node width in canvas units.
pub const NODE_WIDTH: f32 = 100.0;
/// Default step-node height in canvas units.
pub const NODE_HEIGHT: f32 = 70.0;
/// Side length of the square workflow input/output nodes, in canvas units.
pub const IO_NODE_SIZE: f32 = 46.0;

// Ports
/// Radius used when drawing a port circle (in canvas units before zoom).
pub const PORT_RADIUS: f32 = 5.0;
/// Hit-test radius around a port center, in canvas units.
pub const PORT_HIT_RADIUS: f32 = 9.0;

// Grid/drawing
/// Grid cell size in canvas units.
pub const GRID_SIZE: f32 = 20.0;
/// Corner radius for node rectangles.
pub const NODE_CORNER_RADIUS: f32 = 5.0;
/// Base font size for node labels before zoom and counter-scaling.
pub const LABEL_FONT_SIZE: f32 = 12.0;

// Canvas interactions
/// Click threshold in canvas units used for distinguishing click vs drag.
pub const CLICK_THRESHOLD: f32 = 10.0;

// Boundary auto-scroll
/// Reference width of the boundary band at each canvas edge, in screen pixels.
/// Halved repeatedly for small viewports so opposite bands never overlap.
pub const BOUNDARY_BAND: f32 = 40.0;
/// Viewport pan distance applied per auto-scroll tick, in screen pixels.
pub const SCROLL_STEP: f32 = 10.0;
/// Interval between auto-scroll ticks, in seconds (60 Hz).
pub const SCROLL_TICK: f64 = 1.0 / 60.0;

// Port connection resolution
/// Snap radius: the nearest opposite-role port within this distance (canvas
/// units) of the drag's free end becomes the highlighted connect target.
pub const SNAP_RADIUS: f32 = 100.0;
/// Minimum distance (canvas units) between the drag's free end and the origin
/// node before the ghost new-node indicator is shown.
pub const GHOST_THRESHOLD: f32 = 120.0;

// Fit to viewport
/// Padding kept between fitted content and the viewport edges, in screen pixels.
pub const FIT_PADDING: f32 = 40.0;
