//! Questions the editor asks the user
//!
//! `Dialogs` is implemented by whatever can answer synchronously (native
//! dialogs, scripted answers). The window itself answers through the
//! non-blocking prompt overlay in `prompt`.

use std::path::{Path, PathBuf};

/// Answer to "save changes before continuing?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Save,
    Discard,
    Cancel,
}

pub trait Dialogs {
    /// `None` when the picker was cancelled
    fn pick_open_path(&mut self) -> Option<PathBuf>;

    /// `None` when the picker was cancelled
    fn pick_save_path(&mut self, suggested: Option<&Path>) -> Option<PathBuf>;

    fn confirm_discard(&mut self, document_name: &str) -> Choice;

    fn show_error(&mut self, message: &str);

    fn show_info(&mut self, _message: &str) {}
}
