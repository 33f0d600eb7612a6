//! Editor session - one document, its backing file and its modified flag
//!
//! `modified` is false right after a successful load or save and turns true
//! on any buffer mutation (including undo/redo) until the next load/save.

use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::dialogs::{Choice, Dialogs};
use crate::document::{Document, Snapshot};
use crate::error::Result;
use crate::flow::{self, Command, Outcome};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::io::{persisted_text, Filesystem};
use crate::APP_NAME;
use std::path::{Path, PathBuf};

pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub history_limit: usize,
    pub strip_trailing_newline: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            strip_trailing_newline: true,
        }
    }
}

impl From<&EditorConfig> for SessionSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            strip_trailing_newline: config.strip_trailing_newline,
        }
    }
}

/// Cursor movements that never touch the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    PageUp(usize),
    PageDown(usize),
    DocumentStart,
    DocumentEnd,
}

pub struct Session {
    document: Document,
    path: Option<PathBuf>,
    modified: bool,
    history: History<Snapshot>,
    /// Cursor offset right after the last coalescable keystroke
    typing_at: Option<usize>,
    settings: SessionSettings,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            document: Document::new(),
            path: None,
            modified: false,
            history: History::with_max_size(settings.history_limit),
            typing_at: None,
            settings,
        }
    }

    /// Session bound to `path` without reading it; the first save creates the file
    pub fn with_path(settings: SessionSettings, path: PathBuf) -> Self {
        let mut session = Self::new(settings);
        session.path = Some(path);
        session
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// File name of the backing path, or "Untitled"
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Window title, e.g. `*a.txt - Tiny Notepad`
    pub fn title(&self) -> String {
        let marker = if self.modified { "*" } else { "" };
        format!("{}{} - {}", marker, self.display_name(), APP_NAME)
    }

    // === Persistence primitives ===

    /// Empty buffer, no path, clean
    pub fn clear(&mut self) {
        self.document.set_text(String::new());
        self.path = None;
        self.reset_tracking();
    }

    /// Replace the buffer with the file at `path`. State is untouched on failure.
    pub fn load(&mut self, path: &Path, fs: &dyn Filesystem) -> Result<()> {
        let text = fs.read(path)?;
        tracing::info!(path = %path.display(), bytes = text.len(), "Opened file");

        self.document.set_text(text);
        self.path = Some(path.to_path_buf());
        self.reset_tracking();
        Ok(())
    }

    /// Write the buffer to `path`. `modified` is only cleared on success.
    pub fn write(&mut self, path: &Path, fs: &dyn Filesystem) -> Result<()> {
        let text = persisted_text(self.document.text(), self.settings.strip_trailing_newline);
        fs.write(path, text)?;
        tracing::info!(path = %path.display(), bytes = text.len(), "Saved file");

        self.modified = false;
        self.typing_at = None;
        Ok(())
    }

    fn reset_tracking(&mut self) {
        self.modified = false;
        self.typing_at = None;
        self.history.clear();
    }

    // === Actions driven through dialogs ===

    /// Ask before throwing away unsaved changes. True when it is fine to proceed.
    pub fn confirm_discard(&mut self, fs: &dyn Filesystem, dialogs: &mut dyn Dialogs) -> bool {
        if !self.modified {
            return true;
        }

        match dialogs.confirm_discard(&self.display_name()) {
            Choice::Save => {
                flow::drive(Command::Save, self, fs, dialogs);
                !self.modified
            }
            Choice::Discard => true,
            Choice::Cancel => false,
        }
    }

    pub fn new_document(&mut self, fs: &dyn Filesystem, dialogs: &mut dyn Dialogs) -> Outcome {
        flow::drive(Command::New, self, fs, dialogs)
    }

    pub fn open(&mut self, fs: &dyn Filesystem, dialogs: &mut dyn Dialogs) -> Outcome {
        flow::drive(Command::Open, self, fs, dialogs)
    }

    pub fn save(&mut self, fs: &dyn Filesystem, dialogs: &mut dyn Dialogs) -> Outcome {
        flow::drive(Command::Save, self, fs, dialogs)
    }

    pub fn save_as(&mut self, fs: &dyn Filesystem, dialogs: &mut dyn Dialogs) -> Outcome {
        flow::drive(Command::SaveAs, self, fs, dialogs)
    }

    /// True when the program may terminate
    pub fn exit(&mut self, fs: &dyn Filesystem, dialogs: &mut dyn Dialogs) -> bool {
        matches!(flow::drive(Command::Exit, self, fs, dialogs), Outcome::Exit)
    }

    // === Editing ===

    /// Run a buffer mutation, recording an undo checkpoint when it changed something
    fn edit(&mut self, coalesce: bool, apply: impl FnOnce(&mut Document) -> bool) -> bool {
        let before = self.document.snapshot();
        let continues_typing = coalesce && self.typing_at == Some(before.cursor);

        if !apply(&mut self.document) {
            return false;
        }

        if !continues_typing {
            self.history.checkpoint(before);
        }
        self.typing_at = coalesce.then(|| self.document.cursor());
        self.modified = true;
        true
    }

    /// Insert typed or pasted text over the selection.
    /// Runs of word characters typed in a row undo as one step.
    pub fn insert(&mut self, text: &str) -> bool {
        if text.is_empty() && !self.document.has_selection() {
            return false;
        }
        let coalesce = !self.document.has_selection()
            && text.chars().count() == 1
            && text.chars().all(|c| !c.is_whitespace());

        self.edit(coalesce, |doc| {
            doc.replace_selection(text);
            true
        })
    }

    pub fn backspace(&mut self) -> bool {
        self.edit(false, Document::backspace)
    }

    pub fn delete_forward(&mut self) -> bool {
        self.edit(false, Document::delete_forward)
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.document.snapshot()) else {
            return false;
        };
        self.document.restore(previous);
        self.typing_at = None;
        self.modified = true;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.document.snapshot()) else {
            return false;
        };
        self.document.restore(next);
        self.typing_at = None;
        self.modified = true;
        true
    }

    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> bool {
        if !self.document.has_selection() {
            return false;
        }
        clipboard.set_text(self.document.selected_text());
        true
    }

    pub fn cut(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        if !self.copy(clipboard) {
            return false;
        }
        self.edit(false, |doc| {
            doc.replace_selection("");
            true
        })
    }

    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        match clipboard.get_text() {
            Some(text) if !text.is_empty() => self.edit(false, |doc| {
                doc.replace_selection(&text);
                true
            }),
            _ => false,
        }
    }

    pub fn select_all(&mut self) {
        self.typing_at = None;
        self.document.select_all();
    }

    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        self.typing_at = None;
        let doc = &mut self.document;
        match motion {
            Motion::Left => doc.move_left(extend),
            Motion::Right => doc.move_right(extend),
            Motion::Up => doc.move_vertical(-1, extend),
            Motion::Down => doc.move_vertical(1, extend),
            Motion::LineStart => doc.move_line_start(extend),
            Motion::LineEnd => doc.move_line_end(extend),
            Motion::PageUp(lines) => doc.move_vertical(-(lines.max(1) as isize), extend),
            Motion::PageDown(lines) => doc.move_vertical(lines.max(1) as isize, extend),
            Motion::DocumentStart => doc.move_document_start(extend),
            Motion::DocumentEnd => doc.move_document_end(extend),
        }
    }

    /// Place the cursor at a (line, column) position, e.g. from a mouse click
    pub fn place_cursor(&mut self, line: usize, column: usize, extend: bool) {
        self.typing_at = None;
        let offset = self.document.offset_of(line, column);
        self.document.set_cursor(offset, extend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;

    #[test]
    fn test_fresh_session_is_clean() {
        let session = Session::default();
        assert!(session.text().is_empty());
        assert!(session.path().is_none());
        assert!(!session.is_modified());
        assert_eq!(session.title(), "Untitled - Tiny Notepad");
    }

    #[test]
    fn test_edit_marks_modified_and_title() {
        let mut session = Session::with_path(SessionSettings::default(), "/tmp/a.txt".into());
        session.insert("x");
        assert!(session.is_modified());
        assert_eq!(session.title(), "*a.txt - Tiny Notepad");
    }

    #[test]
    fn test_movement_does_not_mark_modified() {
        let mut session = Session::default();
        session.move_cursor(Motion::Right, false);
        session.select_all();
        assert!(!session.is_modified());
    }

    #[test]
    fn test_typing_coalesces_into_words() {
        let mut session = Session::default();
        for ch in ["h", "i", " ", "y", "o"] {
            session.insert(ch);
        }
        assert_eq!(session.text(), "hi yo");

        assert!(session.undo());
        assert_eq!(session.text(), "hi ");
        assert!(session.undo());
        assert_eq!(session.text(), "hi");
        assert!(session.undo());
        assert_eq!(session.text(), "");
        assert!(!session.undo());

        assert!(session.redo());
        assert_eq!(session.text(), "hi");
    }

    #[test]
    fn test_cursor_jump_breaks_coalescing() {
        let mut session = Session::default();
        session.insert("a");
        session.insert("b");
        session.move_cursor(Motion::Left, false);
        session.insert("c");
        assert_eq!(session.text(), "acb");

        session.undo();
        assert_eq!(session.text(), "ab");
    }

    #[test]
    fn test_undo_on_empty_history_keeps_clean() {
        let mut session = Session::default();
        assert!(!session.undo());
        assert!(!session.redo());
        assert!(!session.is_modified());
    }

    #[test]
    fn test_cut_copy_paste() {
        let mut session = Session::default();
        let mut clipboard = MemoryClipboard::default();
        session.insert("hello world");

        assert!(!session.copy(&mut clipboard));

        session.select_all();
        assert!(session.cut(&mut clipboard));
        assert_eq!(session.text(), "");
        assert_eq!(clipboard.get_text().as_deref(), Some("hello world"));

        assert!(session.paste(&mut clipboard));
        assert!(session.paste(&mut clipboard));
        assert_eq!(session.text(), "hello worldhello world");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = Session::with_path(SessionSettings::default(), "/tmp/a.txt".into());
        session.insert("text");
        session.clear();

        assert!(session.text().is_empty());
        assert!(session.path().is_none());
        assert!(!session.is_modified());
        assert!(!session.can_undo());
    }
}
