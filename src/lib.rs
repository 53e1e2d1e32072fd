//! # Workflow Canvas
//!
//! An interactive canvas editor for directed-acyclic workflow graphs: steps,
//! inputs, outputs, and the connections between their ports.
//!
//! ## Features
//! - Node dragging with live edge rewriting
//! - Port-to-port connection drawing with nearest-port snapping and a
//!   ghost-node fallback that spawns new inputs/outputs
//! - Canvas panning and pointer-anchored zooming
//! - Boundary auto-scroll while dragging near the canvas edge
//! - Automatic layered ("zone") layout of the workflow DAG
//! - Single-selection with neighborhood highlighting

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod geometry;
pub mod model;
pub mod ui;

pub use model::{Step, Workflow};
pub use ui::{CanvasApp, CanvasError};

/// Builds a small demonstration workflow for the standalone binary.
pub fn demo_workflow() -> Workflow {
    let mut workflow = Workflow::new();
    let fetch = workflow.add_step(Step::new(
        "Fetch records",
        vec!["query".into()],
        vec!["records".into()],
    ));
    let transform = workflow.add_step(Step::new(
        "Transform",
        vec!["records".into()],
        vec!["result".into()],
    ));

    let fetch_out = workflow.find_step(fetch).unwrap().output_port("records");
    let transform_in = workflow.find_step(transform).unwrap().input_port("records");
    let fetch_in = workflow.find_step(fetch).unwrap().input_port("query");
    let transform_out = workflow.find_step(transform).unwrap().output_port("result");

    workflow
        .connect(&fetch_out, &transform_in)
        .expect("demo ports exist");
    workflow
        .create_input_from_port(&fetch_in)
        .expect("demo port exists");
    workflow
        .create_output_from_port(&transform_out)
        .expect("demo port exists");
    workflow
}

/// Runs the canvas application with a demonstration workflow.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an
/// `eframe::Error` if initialization fails.
///
/// # Example
///
/// ```no_run
/// use workflow_canvas::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Workflow Canvas",
        options,
        Box::new(|_cc| Ok(Box::new(CanvasApp::with_model(demo_workflow())))),
    )
}
