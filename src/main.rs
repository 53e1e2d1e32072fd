fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the canvas application
    workflow_canvas::run_app()
}
