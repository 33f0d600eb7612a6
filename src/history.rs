//! Undo/redo history
//!
//! A bounded two-stack history for any snapshot type

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Undo and redo stacks holding whole snapshots
#[derive(Debug, Clone)]
pub struct History<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    max_size: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Record the state before an edit. Any redo branch is dropped.
    pub fn checkpoint(&mut self, item: T) {
        self.undo.push_back(item);
        self.redo.clear();

        while self.undo.len() > self.max_size {
            self.undo.pop_front();
        }
    }

    /// Swap `current` for the last checkpoint
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Swap `current` for the last undone state
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_swaps_states() {
        let mut history = History::new();
        history.checkpoint("a");
        history.checkpoint("ab");

        assert_eq!(history.undo("abc"), Some("ab"));
        assert_eq!(history.undo("ab"), Some("a"));
        assert_eq!(history.undo("a"), None);

        assert_eq!(history.redo("a"), Some("ab"));
        assert_eq!(history.redo("ab"), Some("abc"));
        assert_eq!(history.redo("abc"), None);
    }

    #[test]
    fn test_checkpoint_clears_redo() {
        let mut history = History::new();
        history.checkpoint(1);
        assert_eq!(history.undo(2), Some(1));
        assert!(history.can_redo());

        history.checkpoint(1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_bounded_size_drops_oldest() {
        let mut history = History::with_max_size(3);
        for i in 0..5 {
            history.checkpoint(i);
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(history.undo(5), Some(4));
        assert_eq!(history.undo(4), Some(3));
        assert_eq!(history.undo(3), Some(2));
        assert_eq!(history.undo(2), None);
    }
}
