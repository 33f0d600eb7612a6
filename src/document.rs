//! Text buffer with a single cursor and selection
//!
//! Offsets are byte offsets into the UTF-8 text and always sit on char
//! boundaries. Columns are counted in chars.

use std::ops::Range;

/// Captured document state for undo/redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub cursor: usize,
    pub anchor: usize,
}

#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    cursor: usize,
    anchor: usize,
    /// Byte offset of the first char of every line
    line_starts: Vec<usize>,
    /// Column to aim for when moving vertically through short lines
    goal_column: Option<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_text(String::new())
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let mut doc = Self {
            text: text.into(),
            cursor: 0,
            anchor: 0,
            line_starts: vec![0],
            goal_column: None,
        };
        doc.reindex();
        doc
    }

    fn reindex(&mut self) {
        self.line_starts.clear();
        self.line_starts.push(0);
        self.line_starts
            .extend(memchr::memchr_iter(b'\n', self.text.as_bytes()).map(|i| i + 1));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace all content and put the cursor at the start
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = 0;
        self.anchor = 0;
        self.goal_column = None;
        self.reindex();
    }

    // === Lines ===

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// End of the line's content, before its `\n`
    pub fn line_end(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(&next) => next - 1,
            None => self.text.len(),
        }
    }

    pub fn line(&self, line: usize) -> &str {
        if line >= self.line_count() {
            return "";
        }
        &self.text[self.line_start(line)..self.line_end(line)]
    }

    /// Line containing a byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// (line, column) of a byte offset
    pub fn position_of(&self, offset: usize) -> (usize, usize) {
        let line = self.line_of(offset);
        let column = self.text[self.line_start(line)..offset].chars().count();
        (line, column)
    }

    /// Byte offset of (line, column), clamped to the document and the line
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        if line >= self.line_count() {
            return self.text.len();
        }
        let start = self.line_start(line);
        self.line(line)
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or_else(|| self.line_end(line))
    }

    fn prev_boundary(&self, offset: usize) -> usize {
        self.text[..offset]
            .chars()
            .next_back()
            .map(|c| offset - c.len_utf8())
            .unwrap_or(0)
    }

    fn next_boundary(&self, offset: usize) -> usize {
        self.text[offset..]
            .chars()
            .next()
            .map(|c| offset + c.len_utf8())
            .unwrap_or(offset)
    }

    // === Cursor and selection ===

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        self.position_of(self.cursor)
    }

    pub fn selection(&self) -> Range<usize> {
        self.cursor.min(self.anchor)..self.cursor.max(self.anchor)
    }

    pub fn has_selection(&self) -> bool {
        self.cursor != self.anchor
    }

    pub fn selected_text(&self) -> &str {
        &self.text[self.selection()]
    }

    /// Move the cursor, keeping the anchor when extending the selection
    pub fn set_cursor(&mut self, offset: usize, extend: bool) {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        self.cursor = offset;
        if !extend {
            self.anchor = offset;
        }
    }

    pub fn select_all(&mut self) {
        self.anchor = 0;
        self.cursor = self.text.len();
        self.goal_column = None;
    }

    pub fn move_left(&mut self, extend: bool) {
        self.goal_column = None;
        let target = if self.has_selection() && !extend {
            self.selection().start
        } else {
            self.prev_boundary(self.cursor)
        };
        self.set_cursor(target, extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        self.goal_column = None;
        let target = if self.has_selection() && !extend {
            self.selection().end
        } else {
            self.next_boundary(self.cursor)
        };
        self.set_cursor(target, extend);
    }

    /// Move `lines` up (negative) or down (positive), keeping the goal column
    pub fn move_vertical(&mut self, lines: isize, extend: bool) {
        let (line, column) = self.cursor_position();
        let goal = *self.goal_column.get_or_insert(column);

        let last = self.line_count() - 1;
        let target_line = if lines < 0 {
            line.saturating_sub(lines.unsigned_abs())
        } else {
            (line + lines as usize).min(last)
        };

        let target = if target_line == line && lines < 0 {
            0
        } else if target_line == line && lines > 0 {
            self.text.len()
        } else {
            self.offset_of(target_line, goal)
        };
        self.set_cursor(target, extend);
    }

    pub fn move_line_start(&mut self, extend: bool) {
        self.goal_column = None;
        let line = self.line_of(self.cursor);
        self.set_cursor(self.line_start(line), extend);
    }

    pub fn move_line_end(&mut self, extend: bool) {
        self.goal_column = None;
        let line = self.line_of(self.cursor);
        self.set_cursor(self.line_end(line), extend);
    }

    pub fn move_document_start(&mut self, extend: bool) {
        self.goal_column = None;
        self.set_cursor(0, extend);
    }

    pub fn move_document_end(&mut self, extend: bool) {
        self.goal_column = None;
        self.set_cursor(self.text.len(), extend);
    }

    // === Mutation ===

    /// Replace the selection (or insert at the cursor) with `text`
    pub fn replace_selection(&mut self, text: &str) {
        let range = self.selection();
        self.text.replace_range(range.clone(), text);
        let cursor = range.start + text.len();
        self.cursor = cursor;
        self.anchor = cursor;
        self.goal_column = None;
        self.reindex();
    }

    /// Delete the selection or the char before the cursor.
    /// Returns false when there was nothing to delete.
    pub fn backspace(&mut self) -> bool {
        if !self.has_selection() {
            if self.cursor == 0 {
                return false;
            }
            self.anchor = self.prev_boundary(self.cursor);
        }
        self.replace_selection("");
        true
    }

    /// Delete the selection or the char after the cursor
    pub fn delete_forward(&mut self) -> bool {
        if !self.has_selection() {
            if self.cursor == self.text.len() {
                return false;
            }
            self.anchor = self.next_boundary(self.cursor);
        }
        self.replace_selection("");
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            cursor: self.cursor,
            anchor: self.anchor,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.text = snapshot.text;
        self.reindex();
        self.goal_column = None;
        self.set_cursor(snapshot.anchor, false);
        self.set_cursor(snapshot.cursor, true);
    }
}
