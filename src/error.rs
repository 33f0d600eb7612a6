//! Notepad error types

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotepadError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{} is not valid UTF-8 text", .0.display())]
    InvalidUtf8(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl NotepadError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => NotepadError::FileNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => NotepadError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::InvalidData => NotepadError::InvalidUtf8(path.to_path_buf()),
            _ => NotepadError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NotepadError::FileNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, NotepadError>;
