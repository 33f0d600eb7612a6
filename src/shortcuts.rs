//! Shortcut registry - maps accelerators to editor actions
//!
//! Built-in defaults can be overridden per action from shortcuts.toml:
//!
//! ```toml
//! [shortcuts]
//! save = "primary+s"
//! redo = ["primary+shift+z", "primary+y"]
//! ```

use crate::accelerator::{Accelerator, Modifiers, Trigger};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_SHORTCUTS_FILE: &str = "shortcuts.toml";

/// Every user-triggerable action of the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    New,
    Open,
    Save,
    SaveAs,
    Exit,
    NewTab,
    CloseTab,
    NextTab,
    PreviousTab,
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::New,
        Action::Open,
        Action::Save,
        Action::SaveAs,
        Action::Exit,
        Action::NewTab,
        Action::CloseTab,
        Action::NextTab,
        Action::PreviousTab,
        Action::Undo,
        Action::Redo,
        Action::Cut,
        Action::Copy,
        Action::Paste,
        Action::SelectAll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::New => "new",
            Action::Open => "open",
            Action::Save => "save",
            Action::SaveAs => "save_as",
            Action::Exit => "exit",
            Action::NewTab => "new_tab",
            Action::CloseTab => "close_tab",
            Action::NextTab => "next_tab",
            Action::PreviousTab => "previous_tab",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::Cut => "cut",
            Action::Copy => "copy",
            Action::Paste => "paste",
            Action::SelectAll => "select_all",
        }
    }

    fn default_accelerators(self) -> &'static [&'static str] {
        match self {
            Action::New => &["primary+n"],
            Action::Open => &["primary+o"],
            Action::Save => &["primary+s"],
            Action::SaveAs => &["primary+shift+s"],
            Action::Exit => &["primary+q"],
            Action::NewTab => &["primary+t"],
            Action::CloseTab => &["primary+w"],
            Action::NextTab => &["ctrl+tab"],
            Action::PreviousTab => &["ctrl+shift+tab"],
            Action::Undo => &["primary+z"],
            Action::Redo => &["primary+shift+z", "primary+y"],
            Action::Cut => &["primary+x"],
            Action::Copy => &["primary+c"],
            Action::Paste => &["primary+v"],
            Action::SelectAll => &["primary+a"],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}

/// TOML configuration structure
#[derive(Debug, Default, Deserialize)]
struct ShortcutsConfig {
    #[serde(default)]
    shortcuts: HashMap<String, ShortcutValue>,
}

/// A shortcut value can be either a single string or an array of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ShortcutValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ShortcutValue {
    fn as_vec(&self) -> Vec<String> {
        match self {
            ShortcutValue::Single(s) => vec![s.clone()],
            ShortcutValue::Multiple(v) => v.clone(),
        }
    }
}

/// Maps accelerators to actions
pub struct ShortcutRegistry {
    shortcuts: Vec<(Accelerator, Action)>,
}

impl Default for ShortcutRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ShortcutRegistry {
    /// Built-in bindings only
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            shortcuts: Vec::new(),
        };
        for action in Action::ALL {
            for accelerator in action.default_accelerators() {
                registry.register(accelerator, action);
            }
        }
        registry
    }

    /// Built-in bindings plus overrides from `path`, if it exists
    pub fn load(path: &Path) -> Self {
        let mut registry = Self::with_defaults();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No shortcuts file, using defaults");
            return registry;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => registry.apply_overrides(&content),
            Err(e) => tracing::warn!(path = %path.display(), "Failed to read shortcuts: {}", e),
        }
        registry
    }

    /// Replace the bindings of every action named in `content`
    pub fn apply_overrides(&mut self, content: &str) {
        let config = match toml::from_str::<ShortcutsConfig>(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("TOML syntax error in shortcuts: {}; keeping defaults", e);
                return;
            }
        };

        for (name, value) in config.shortcuts {
            let action = match name.parse::<Action>() {
                Ok(action) => action,
                Err(e) => {
                    tracing::warn!("{}", e);
                    continue;
                }
            };

            self.shortcuts.retain(|(_, bound)| *bound != action);
            for accelerator in value.as_vec() {
                self.register(&accelerator, action);
            }
        }
    }

    /// Bind an accelerator; a later binding of the same chord wins
    fn register(&mut self, accelerator: &str, action: Action) {
        let acc = match Accelerator::parse(accelerator) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!("Failed to parse accelerator '{}': {}", accelerator, e);
                return;
            }
        };

        self.shortcuts.retain(|(bound, _)| *bound != acc);
        self.shortcuts.push((acc, action));
    }

    pub fn match_input(&self, modifiers: &Modifiers, trigger: &Trigger) -> Option<Action> {
        self.shortcuts
            .iter()
            .find(|(acc, _)| acc.matches(modifiers, trigger))
            .map(|(_, action)| *action)
    }

    pub fn accelerators_for(&self, action: Action) -> Vec<&Accelerator> {
        self.shortcuts
            .iter()
            .filter(|(_, bound)| *bound == action)
            .map(|(acc, _)| acc)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_trigger(c: &str) -> Trigger {
        Trigger::Char(c.to_string())
    }

    #[test]
    fn test_defaults_cover_every_action() {
        let registry = ShortcutRegistry::with_defaults();
        for action in Action::ALL {
            assert!(
                !registry.accelerators_for(action).is_empty(),
                "{} has no shortcut",
                action
            );
        }
    }

    #[test]
    fn test_default_match() {
        let registry = ShortcutRegistry::with_defaults();
        let primary = Modifiers::primary();
        assert_eq!(registry.match_input(&primary, &char_trigger("s")), Some(Action::Save));
        assert_eq!(registry.match_input(&primary, &char_trigger("a")), Some(Action::SelectAll));

        let mut primary_shift = primary;
        primary_shift.shift = true;
        assert_eq!(
            registry.match_input(&primary_shift, &char_trigger("s")),
            Some(Action::SaveAs)
        );

        assert_eq!(registry.match_input(&Modifiers::none(), &char_trigger("s")), None);
    }

    #[test]
    fn test_overrides_replace_action_bindings() {
        let mut registry = ShortcutRegistry::with_defaults();
        registry.apply_overrides(
            r#"
            [shortcuts]
            save = ["f2", "alt+s"]
            bogus = "ctrl+b"
            "#,
        );

        let primary = Modifiers::primary();
        assert_eq!(registry.match_input(&primary, &char_trigger("s")), None);
        assert_eq!(
            registry.match_input(&Modifiers::none(), &Trigger::Named("F2".to_string())),
            Some(Action::Save)
        );

        let mut alt = Modifiers::none();
        alt.alt = true;
        assert_eq!(registry.match_input(&alt, &char_trigger("s")), Some(Action::Save));
        assert_eq!(registry.accelerators_for(Action::Open).len(), 1);
    }

    #[test]
    fn test_malformed_overrides_keep_defaults() {
        let mut registry = ShortcutRegistry::with_defaults();
        registry.apply_overrides("[shortcuts\nsave = ");
        assert_eq!(
            registry.match_input(&Modifiers::primary(), &char_trigger("s")),
            Some(Action::Save)
        );
    }

    #[test]
    fn test_action_names_roundtrip() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>(), Ok(action));
        }
        assert!("launch".parse::<Action>().is_err());
    }
}
