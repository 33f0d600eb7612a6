//! In-window prompt overlay
//!
//! Answers the flow's questions without blocking the event loop: a
//! Save / Discard / Cancel choice, or a one-line path editor.

use crate::dialogs::Choice;
use crate::flow::{Answer, Prompt};
use std::path::{Path, PathBuf};

/// Keys the overlay understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKey {
    Text(String),
    Backspace,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState {
    Choice { name: String },
    Path { open: bool, input: String },
}

impl PromptState {
    pub fn new(prompt: Prompt) -> Self {
        match prompt {
            Prompt::ConfirmDiscard { name } => PromptState::Choice { name },
            Prompt::OpenPath => PromptState::Path {
                open: true,
                input: default_directory(),
            },
            Prompt::SavePath { suggested } => PromptState::Path {
                open: false,
                input: suggested
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(default_directory),
            },
        }
    }

    /// Headline shown at the top of the overlay
    pub fn title(&self) -> String {
        match self {
            PromptState::Choice { name } => format!("Save changes to {}?", name),
            PromptState::Path { open: true, .. } => "Open file".to_string(),
            PromptState::Path { open: false, .. } => "Save as".to_string(),
        }
    }

    /// Hint line listing the keys
    pub fn hint(&self) -> &'static str {
        match self {
            PromptState::Choice { .. } => "[S]ave   [D]iscard   [C]ancel",
            PromptState::Path { .. } => "Enter to confirm, Esc to cancel",
        }
    }

    /// Editable text, if any
    pub fn input(&self) -> Option<&str> {
        match self {
            PromptState::Choice { .. } => None,
            PromptState::Path { input, .. } => Some(input),
        }
    }

    /// Feed a key. Returns the answer once the user decided.
    pub fn handle_key(&mut self, key: PromptKey) -> Option<Answer> {
        match self {
            PromptState::Choice { .. } => {
                let choice = match key {
                    PromptKey::Enter => Choice::Save,
                    PromptKey::Escape => Choice::Cancel,
                    PromptKey::Text(text) => match text.to_lowercase().as_str() {
                        "s" | "y" => Choice::Save,
                        "d" | "n" => Choice::Discard,
                        "c" => Choice::Cancel,
                        _ => return None,
                    },
                    PromptKey::Backspace => return None,
                };
                Some(Answer::Choice(choice))
            }
            PromptState::Path { input, .. } => match key {
                PromptKey::Text(text) => {
                    input.push_str(&text);
                    None
                }
                PromptKey::Backspace => {
                    input.pop();
                    None
                }
                PromptKey::Escape => Some(Answer::Path(None)),
                PromptKey::Enter => Some(Answer::Path(resolve_input(input))),
            },
        }
    }
}

fn default_directory() -> String {
    std::env::current_dir()
        .map(|dir| format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR))
        .unwrap_or_default()
}

/// Turn typed text into a path; blank input counts as cancel
fn resolve_input(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return Some(Path::new(&home).join(rest));
        }
    }
    Some(PathBuf::from(trimmed))
}
