//! Bare window: opens a titled, positioned window and runs until it is closed

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalPosition, LogicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

const TITLE: &str = "기본 창";

#[derive(Default)]
struct WindowShell {
    window: Option<Window>,
}

impl ApplicationHandler for WindowShell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_position(LogicalPosition::new(300.0, 300.0))
            .with_inner_size(LogicalSize::new(400.0, 300.0));

        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            tracing::info!("Window closed");
            event_loop.exit();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tiny_notepad::init_logging();

    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut WindowShell::default())?;
    Ok(())
}
