//! Tiny Notepad - main entry point
//!
//! Usage: tiny-notepad [FILE]...

use std::path::PathBuf;
use tiny_notepad::{app::NotepadApp, init_logging, AppConfig};
use winit::event_loop::EventLoop;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let config = AppConfig::load();
    tracing::info!(files = paths.len(), "Starting {}", tiny_notepad::APP_NAME);

    let event_loop = EventLoop::new()?;
    let mut app = NotepadApp::new(config, &paths);
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.take_error() {
        return Err(e.into());
    }
    Ok(())
}
