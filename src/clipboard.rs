//! Clipboard access
//!
//! The system clipboard is tried first; an in-process copy covers platforms
//! (or headless sessions) where it is unavailable.

pub trait Clipboard {
    fn get_text(&mut self) -> Option<String>;
    fn set_text(&mut self, text: &str);
}

/// arboard-backed clipboard with a local fallback
pub struct SystemClipboard {
    system: Option<arboard::Clipboard>,
    local: Option<String>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                tracing::warn!("System clipboard unavailable: {}", e);
                None
            }
        };
        Self { system, local: None }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.system
            .as_mut()
            .and_then(|c| c.get_text().ok())
            .or_else(|| self.local.clone())
    }

    fn set_text(&mut self, text: &str) {
        self.local = Some(text.to_string());
        if let Some(clipboard) = self.system.as_mut() {
            if let Err(e) = clipboard.set_text(text) {
                tracing::debug!("Failed to set system clipboard: {}", e);
            }
        }
    }
}

/// Process-local clipboard
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}
