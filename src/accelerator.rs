//! Accelerator parsing and matching
//!
//! Accelerators are single chords: "ctrl+s", "cmd+shift+z", "ctrl+tab".
//! `primary` stands for cmd on macOS and ctrl everywhere else.

use winit::keyboard::{Key, ModifiersState};

/// A keyboard shortcut (modifiers + trigger)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accelerator {
    pub modifiers: Modifiers,
    pub trigger: Trigger,
}

/// Modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub cmd: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    /// The platform's command modifier alone
    pub fn primary() -> Self {
        let mut modifiers = Self::default();
        modifiers.set_primary();
        modifiers
    }

    fn set_primary(&mut self) {
        if cfg!(target_os = "macos") {
            self.cmd = true;
        } else {
            self.ctrl = true;
        }
    }

    pub fn from_state(state: ModifiersState) -> Self {
        Self {
            cmd: state.super_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            shift: state.shift_key(),
        }
    }

    /// True when a command-style modifier is held (text input should not insert)
    pub fn is_command(&self) -> bool {
        self.cmd || self.ctrl || self.alt
    }
}

/// The key that fires a chord
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Character key, lowercased
    Char(String),
    /// Named key (Enter, Tab, ArrowUp, ...)
    Named(String),
}

impl Trigger {
    /// Map a winit logical key to a trigger
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) => Some(Trigger::Char(ch.to_lowercase())),
            Key::Named(named) => Some(Trigger::Named(format!("{:?}", named))),
            _ => None,
        }
    }
}

impl Accelerator {
    /// Parse an accelerator string such as "primary+shift+s"
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("Empty accelerator".to_string());
        }

        let parts: Vec<&str> = input.split('+').map(str::trim).collect();
        // Last part is the trigger, rest are modifiers
        let (mod_parts, trigger_part) = parts.split_at(parts.len() - 1);

        let mut modifiers = Modifiers::default();
        for mod_str in mod_parts {
            match mod_str.to_lowercase().as_str() {
                "primary" | "mod" => modifiers.set_primary(),
                "cmd" | "super" => modifiers.cmd = true,
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                _ => return Err(format!("Unknown modifier: {}", mod_str)),
            }
        }

        let trigger_str = trigger_part[0];
        if trigger_str.is_empty() {
            return Err(format!("Missing key in accelerator: {}", input));
        }

        let trigger = if trigger_str.chars().count() == 1 {
            Trigger::Char(trigger_str.to_lowercase())
        } else {
            let named = match trigger_str.to_lowercase().as_str() {
                "enter" | "return" => "Enter",
                "tab" => "Tab",
                "backspace" => "Backspace",
                "delete" => "Delete",
                "escape" | "esc" => "Escape",
                "space" => "Space",
                "up" | "arrowup" => "ArrowUp",
                "down" | "arrowdown" => "ArrowDown",
                "left" | "arrowleft" => "ArrowLeft",
                "right" | "arrowright" => "ArrowRight",
                "home" => "Home",
                "end" => "End",
                "pageup" => "PageUp",
                "pagedown" => "PageDown",
                f if f.starts_with('f') && f[1..].parse::<u8>().is_ok() => {
                    return Ok(Accelerator {
                        modifiers,
                        trigger: Trigger::Named(f.to_uppercase()),
                    })
                }
                _ => return Err(format!("Unknown key: {}", trigger_str)),
            };
            Trigger::Named(named.to_string())
        };

        Ok(Accelerator { modifiers, trigger })
    }

    pub fn matches(&self, modifiers: &Modifiers, trigger: &Trigger) -> bool {
        self.modifiers == *modifiers && self.trigger == *trigger
    }
}
