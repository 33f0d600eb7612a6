#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub const APP_NAME: &str = "Tiny Notepad";

pub mod accelerator;
pub mod app;
pub mod clipboard;
pub mod config;
pub mod dialogs;
pub mod document;
pub mod error;
pub mod flow;
pub mod font;
pub mod gpu;
pub mod history;
pub mod io;
pub mod prompt;
pub mod render;
pub mod session;
pub mod shortcuts;
pub mod theme;
pub mod workspace;

// Re-export core types
pub use config::AppConfig;
pub use dialogs::{Choice, Dialogs};
pub use document::Document;
pub use error::{NotepadError, Result};
pub use flow::{Answer, Command, Flow, Outcome, Prompt, Step};
pub use history::History;
pub use io::{DiskFilesystem, Filesystem};
pub use session::{Session, SessionSettings};
pub use shortcuts::{Action, ShortcutRegistry};
pub use workspace::{Response, Workspace};

/// Initialize tracing; `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding)
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
