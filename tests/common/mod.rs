//! Shared fakes for the integration tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use tiny_notepad::dialogs::{Choice, Dialogs};
use tiny_notepad::error::{NotepadError, Result};
use tiny_notepad::io::Filesystem;

/// In-memory filesystem that counts writes and can be told to fail them
#[derive(Default)]
pub struct MemoryFilesystem {
    files: RefCell<HashMap<PathBuf, String>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: &str) -> Self {
        self.files.borrow_mut().insert(path.into(), text.to_string());
        self
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl Filesystem for MemoryFilesystem {
    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| NotepadError::FileNotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(NotepadError::from_io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        self.writes.set(self.writes.get() + 1);
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}

/// Dialogs answering from a script; records what was asked and shown
#[derive(Default)]
pub struct ScriptedDialogs {
    pub choices: VecDeque<Choice>,
    pub open_paths: VecDeque<Option<PathBuf>>,
    pub save_paths: VecDeque<Option<PathBuf>>,
    pub confirmations: Vec<String>,
    pub suggestions: Vec<Option<PathBuf>>,
    pub errors: Vec<String>,
    pub infos: Vec<String>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose(mut self, choice: Choice) -> Self {
        self.choices.push_back(choice);
        self
    }

    pub fn open_path(mut self, path: Option<&str>) -> Self {
        self.open_paths.push_back(path.map(PathBuf::from));
        self
    }

    pub fn save_path(mut self, path: Option<&str>) -> Self {
        self.save_paths.push_back(path.map(PathBuf::from));
        self
    }

    pub fn prompts(&self) -> usize {
        self.confirmations.len()
    }
}

impl Dialogs for ScriptedDialogs {
    fn pick_open_path(&mut self) -> Option<PathBuf> {
        self.open_paths.pop_front().expect("unexpected open picker")
    }

    fn pick_save_path(&mut self, suggested: Option<&Path>) -> Option<PathBuf> {
        self.suggestions.push(suggested.map(Path::to_path_buf));
        self.save_paths.pop_front().expect("unexpected save picker")
    }

    fn confirm_discard(&mut self, document_name: &str) -> Choice {
        self.confirmations.push(document_name.to_string());
        self.choices.pop_front().expect("unexpected confirmation")
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }
}
