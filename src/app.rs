//! Window shell - winit event handling around the workspace
//!
//! Keys go to the prompt overlay when one is open, then to the shortcut
//! registry, then to the active document.

use crate::accelerator::{Modifiers, Trigger};
use crate::clipboard::SystemClipboard;
use crate::config::AppConfig;
use crate::error::NotepadError;
use crate::font::GlyphAtlas;
use crate::gpu::GpuRenderer;
use crate::io::DiskFilesystem;
use crate::prompt::{PromptKey, PromptState};
use crate::render::{self, FrameContext, Layout, StatusMessage};
use crate::session::{Motion, SessionSettings};
use crate::shortcuts::{Action, ShortcutRegistry, DEFAULT_SHORTCUTS_FILE};
use crate::theme::Theme;
use crate::workspace::{Response, Workspace};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

const WHEEL_LINES: f32 = 3.0;

/// Window, GPU and glyph state; exists once the event loop resumed
struct View {
    window: Arc<Window>,
    gpu: GpuRenderer,
    atlas: GlyphAtlas,
}

impl View {
    fn layout(&self) -> Layout {
        let (width, height) = self.gpu.size();
        Layout::new(
            width as f32,
            height as f32,
            self.window.scale_factor() as f32,
            self.atlas.line_metrics(),
        )
    }
}

/// Edits a key press applies to the active document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKey {
    Insert(String),
    Backspace,
    Delete,
    /// Motion, and whether it extends the selection
    Move(Motion, bool),
}

/// Where a key press goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRoute {
    Prompt(PromptKey),
    Action(Action),
    Edit(EditKey),
    Ignore,
}

/// Route a key press. An open prompt takes every key; otherwise bound
/// shortcuts win over text entry, so `primary+a` never types an `a`.
/// `page` is the number of visible lines for PageUp/PageDown.
pub fn route_key(
    shortcuts: &ShortcutRegistry,
    prompt_open: bool,
    modifiers: &Modifiers,
    key: &Key,
    text: Option<&str>,
    page: usize,
) -> KeyRoute {
    let printable = text.filter(|text| !text.is_empty() && !text.chars().any(char::is_control));

    if prompt_open {
        return match key {
            Key::Named(NamedKey::Enter) => KeyRoute::Prompt(PromptKey::Enter),
            Key::Named(NamedKey::Escape) => KeyRoute::Prompt(PromptKey::Escape),
            Key::Named(NamedKey::Backspace) => KeyRoute::Prompt(PromptKey::Backspace),
            _ if modifiers.is_command() => KeyRoute::Ignore,
            _ => match printable {
                Some(text) => KeyRoute::Prompt(PromptKey::Text(text.to_string())),
                None => KeyRoute::Ignore,
            },
        };
    }

    if let Some(action) =
        Trigger::from_key(key).and_then(|trigger| shortcuts.match_input(modifiers, &trigger))
    {
        return KeyRoute::Action(action);
    }

    let extend = modifiers.shift;
    let jump = modifiers.ctrl || modifiers.cmd;
    let motion = match key {
        Key::Named(NamedKey::Backspace) => return KeyRoute::Edit(EditKey::Backspace),
        Key::Named(NamedKey::Delete) => return KeyRoute::Edit(EditKey::Delete),
        Key::Named(NamedKey::Enter) => return KeyRoute::Edit(EditKey::Insert("\n".into())),
        Key::Named(NamedKey::Tab) if !modifiers.is_command() => {
            return KeyRoute::Edit(EditKey::Insert("\t".into()))
        }
        Key::Named(NamedKey::ArrowLeft) => Motion::Left,
        Key::Named(NamedKey::ArrowRight) => Motion::Right,
        Key::Named(NamedKey::ArrowUp) if jump => Motion::DocumentStart,
        Key::Named(NamedKey::ArrowDown) if jump => Motion::DocumentEnd,
        Key::Named(NamedKey::ArrowUp) => Motion::Up,
        Key::Named(NamedKey::ArrowDown) => Motion::Down,
        Key::Named(NamedKey::Home) if jump => Motion::DocumentStart,
        Key::Named(NamedKey::End) if jump => Motion::DocumentEnd,
        Key::Named(NamedKey::Home) => Motion::LineStart,
        Key::Named(NamedKey::End) => Motion::LineEnd,
        Key::Named(NamedKey::PageUp) => Motion::PageUp(page),
        Key::Named(NamedKey::PageDown) => Motion::PageDown(page),
        _ if modifiers.is_command() => return KeyRoute::Ignore,
        _ => {
            return match printable {
                Some(text) => KeyRoute::Edit(EditKey::Insert(text.to_string())),
                None => KeyRoute::Ignore,
            }
        }
    };

    KeyRoute::Edit(EditKey::Move(motion, extend))
}

pub struct NotepadApp {
    config: AppConfig,
    workspace: Workspace,
    fs: DiskFilesystem,
    clipboard: SystemClipboard,
    shortcuts: ShortcutRegistry,
    theme: Theme,
    view: Option<View>,

    prompt: Option<PromptState>,
    status: Option<StatusMessage>,
    modifiers: Modifiers,

    scroll_line: usize,
    /// Scroll to the cursor on the next frame
    follow_cursor: bool,
    pointer: (f32, f32),
    dragging: bool,

    /// Error that stopped the event loop
    fatal: Option<NotepadError>,
}

impl NotepadApp {
    pub fn new(config: AppConfig, paths: &[PathBuf]) -> Self {
        let mut workspace = Workspace::new(SessionSettings::from(&config.editor));
        let fs = DiskFilesystem;
        let status = workspace
            .open_paths(paths, &fs)
            .into_iter()
            .inspect(|e| tracing::error!("{}", e))
            .last()
            .map(|e| StatusMessage::error(e.to_string()));

        Self {
            theme: Theme::by_name(&config.editor.theme),
            shortcuts: ShortcutRegistry::load(Path::new(DEFAULT_SHORTCUTS_FILE)),
            clipboard: SystemClipboard::new(),
            config,
            workspace,
            fs,
            view: None,
            prompt: None,
            status,
            modifiers: Modifiers::none(),
            scroll_line: 0,
            follow_cursor: true,
            pointer: (0.0, 0.0),
            dragging: false,
            fatal: None,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Error that ended the run early, if any
    pub fn take_error(&mut self) -> Option<NotepadError> {
        self.fatal.take()
    }

    fn create_view(&self, event_loop: &ActiveEventLoop) -> Result<View, NotepadError> {
        let attributes = Window::default_attributes()
            .with_title(self.workspace.title())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| NotepadError::Gpu(format!("create window: {}", e)))?,
        );

        let scale_factor = window.scale_factor() as f32;
        let mut atlas = GlyphAtlas::load(&self.config.font, self.config.editor.font_size * scale_factor)?;
        atlas.prerasterize_ascii();

        let gpu = pollster::block_on(GpuRenderer::new(window.clone(), atlas.atlas_size()))?;
        Ok(View { window, gpu, atlas })
    }

    fn request_redraw(&self) {
        if let Some(view) = &self.view {
            view.window.request_redraw();
        }
    }

    fn sync_title(&self) {
        if let Some(view) = &self.view {
            let title = self.workspace.title();
            if view.window.title() != title {
                view.window.set_title(&title);
            }
        }
    }

    fn apply(&mut self, response: Response, event_loop: &ActiveEventLoop) {
        match response {
            Response::Idle => return,
            Response::Redraw => {}
            Response::Saved(path) => {
                self.status = Some(StatusMessage::info(format!("Saved {}", path.display())));
            }
            Response::Ask(prompt) => {
                tracing::debug!(?prompt, "Prompting");
                self.prompt = Some(PromptState::new(prompt));
            }
            Response::Failed(e) => {
                tracing::error!("{}", e);
                self.status = Some(StatusMessage::error(e.to_string()));
            }
            Response::Exit => {
                event_loop.exit();
                return;
            }
        }
        self.follow_cursor = true;
        self.sync_title();
        self.request_redraw();
    }

    fn dispatch(&mut self, action: Action, event_loop: &ActiveEventLoop) {
        tracing::debug!(%action, "Dispatch");
        let response = self
            .workspace
            .dispatch(action, &self.fs, &mut self.clipboard);
        self.apply(response, event_loop);
    }

    fn on_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.state != ElementState::Pressed {
            return;
        }
        self.status = None;

        let page = self
            .view
            .as_ref()
            .map(|view| view.layout().visible_lines())
            .unwrap_or(1);
        let route = route_key(
            &self.shortcuts,
            self.prompt.is_some(),
            &self.modifiers,
            &event.logical_key,
            event.text.as_deref(),
            page,
        );

        match route {
            KeyRoute::Prompt(key) => {
                let answer = self.prompt.as_mut().and_then(|prompt| prompt.handle_key(key));
                if let Some(answer) = answer {
                    self.prompt = None;
                    let response = self.workspace.answer(answer, &self.fs);
                    self.apply(response, event_loop);
                }
                self.request_redraw();
            }
            KeyRoute::Action(action) => self.dispatch(action, event_loop),
            KeyRoute::Edit(key) => {
                if self.edit(key) {
                    self.follow_cursor = true;
                    self.sync_title();
                    self.request_redraw();
                }
            }
            KeyRoute::Ignore => {
                if self.prompt.is_some() {
                    self.request_redraw();
                }
            }
        }
    }

    /// Text entry and cursor motion. Returns true if anything changed.
    fn edit(&mut self, key: EditKey) -> bool {
        let session = self.workspace.active_mut();
        match key {
            EditKey::Insert(text) => session.insert(&text),
            EditKey::Backspace => session.backspace(),
            EditKey::Delete => session.delete_forward(),
            EditKey::Move(motion, extend) => {
                session.move_cursor(motion, extend);
                true
            }
        }
    }

    fn on_mouse_press(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let layout = view.layout();
        let (x, y) = self.pointer;

        if let Some(tab) = render::tab_at(&layout, &mut view.atlas, &self.workspace, x, y) {
            if self.workspace.switch_to(tab) {
                self.scroll_line = 0;
                self.follow_cursor = true;
                self.sync_title();
            }
            return;
        }

        if layout.text_area().contains(x, y) {
            let (line, column) = render::hit_test(
                &layout,
                &mut view.atlas,
                self.workspace.active().document(),
                self.scroll_line,
                x,
                y,
            );
            self.workspace
                .active_mut()
                .place_cursor(line, column, self.modifiers.shift);
            self.dragging = true;
        }
    }

    fn on_mouse_drag(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let layout = view.layout();
        let (line, column) = render::hit_test(
            &layout,
            &mut view.atlas,
            self.workspace.active().document(),
            self.scroll_line,
            self.pointer.0,
            self.pointer.1,
        );
        self.workspace.active_mut().place_cursor(line, column, true);
    }

    fn scroll_by(&mut self, lines: f32) {
        let last = self.workspace.active().document().line_count() - 1;
        let target = (self.scroll_line as f32 + lines).round().max(0.0) as usize;
        self.scroll_line = target.min(last);
        self.follow_cursor = false;
    }

    fn render_frame(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let layout = view.layout();

        if self.follow_cursor {
            let (cursor_line, _) = self.workspace.active().document().cursor_position();
            self.scroll_line =
                render::scroll_to_cursor(self.scroll_line, cursor_line, layout.visible_lines());
            self.follow_cursor = false;
        }

        let ctx = FrameContext {
            workspace: &self.workspace,
            theme: &self.theme,
            layout,
            scroll_line: self.scroll_line,
            prompt: self.prompt.as_ref(),
            status: self.status.as_ref(),
        };
        let layers = render::build_frame(&ctx, &mut view.atlas);

        // Building the frame may have rasterized new glyphs
        if view.atlas.take_dirty() {
            let (width, height) = view.atlas.atlas_size();
            view.gpu.upload_atlas(view.atlas.atlas_data(), width, height);
        }

        if let Err(e) = view.gpu.render(&layers, self.theme.clear_color()) {
            tracing::error!("Render failed: {}", e);
        }
    }
}

impl ApplicationHandler for NotepadApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() {
            return;
        }

        match self.create_view(event_loop) {
            Ok(view) => {
                tracing::info!(
                    scale_factor = view.window.scale_factor(),
                    font_px = view.atlas.size_px(),
                    "Window ready"
                );
                view.window.request_redraw();
                self.view = Some(view);
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if self.prompt.is_none() {
                    self.dispatch(Action::Exit, event_loop);
                }
            }

            WindowEvent::Resized(size) => {
                if let Some(view) = self.view.as_mut() {
                    view.gpu.resize(size.width, size.height);
                    self.follow_cursor = true;
                    view.window.request_redraw();
                }
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(view) = self.view.as_mut() {
                    view.atlas
                        .set_size(self.config.editor.font_size * scale_factor as f32);
                    view.window.request_redraw();
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = Modifiers::from_state(modifiers.state());
            }

            WindowEvent::KeyboardInput { event, .. } => self.on_key(&event, event_loop),

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = (position.x as f32, position.y as f32);
                if self.dragging && self.prompt.is_none() {
                    self.on_mouse_drag();
                    self.follow_cursor = true;
                    self.request_redraw();
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if self.prompt.is_none() => {
                    self.on_mouse_press();
                    self.request_redraw();
                }
                _ => self.dragging = false,
            },

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINES,
                    MouseScrollDelta::PixelDelta(position) => {
                        let line_height = self
                            .view
                            .as_ref()
                            .map(|view| view.atlas.line_metrics().line_height)
                            .unwrap_or(1.0);
                        -(position.y as f32) / line_height
                    }
                };
                self.scroll_by(lines);
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => self.render_frame(),

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_key(c: &str) -> Key {
        Key::Character(c.into())
    }

    fn route(prompt_open: bool, modifiers: Modifiers, key: Key, text: Option<&str>) -> KeyRoute {
        let shortcuts = ShortcutRegistry::with_defaults();
        route_key(&shortcuts, prompt_open, &modifiers, &key, text, 10)
    }

    #[test]
    fn test_select_all_chord_is_not_typed() {
        // winit still reports text "a" for the chord on most platforms
        let routed = route(false, Modifiers::primary(), char_key("a"), Some("a"));
        assert_eq!(routed, KeyRoute::Action(Action::SelectAll));
    }

    #[test]
    fn test_plain_letter_inserts() {
        let routed = route(false, Modifiers::none(), char_key("a"), Some("a"));
        assert_eq!(routed, KeyRoute::Edit(EditKey::Insert("a".into())));
    }

    #[test]
    fn test_unbound_command_chord_is_ignored() {
        let routed = route(false, Modifiers::primary(), char_key("k"), Some("k"));
        assert_eq!(routed, KeyRoute::Ignore);
    }

    #[test]
    fn test_prompt_takes_keys_before_shortcuts() {
        let routed = route(true, Modifiers::primary(), char_key("a"), Some("a"));
        assert_eq!(routed, KeyRoute::Ignore);

        let routed = route(true, Modifiers::none(), Key::Named(NamedKey::Enter), Some("\r"));
        assert_eq!(routed, KeyRoute::Prompt(PromptKey::Enter));

        let routed = route(true, Modifiers::none(), char_key("s"), Some("s"));
        assert_eq!(routed, KeyRoute::Prompt(PromptKey::Text("s".into())));
    }

    #[test]
    fn test_navigation_keys() {
        let shift = Modifiers {
            shift: true,
            ..Modifiers::none()
        };
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::none()
        };

        assert_eq!(
            route(false, shift, Key::Named(NamedKey::ArrowLeft), None),
            KeyRoute::Edit(EditKey::Move(Motion::Left, true))
        );
        assert_eq!(
            route(false, ctrl, Key::Named(NamedKey::Home), None),
            KeyRoute::Edit(EditKey::Move(Motion::DocumentStart, false))
        );
        assert_eq!(
            route(false, Modifiers::none(), Key::Named(NamedKey::PageDown), None),
            KeyRoute::Edit(EditKey::Move(Motion::PageDown(10), false))
        );
    }

    #[test]
    fn test_enter_and_tab_insert() {
        assert_eq!(
            route(false, Modifiers::none(), Key::Named(NamedKey::Enter), Some("\r")),
            KeyRoute::Edit(EditKey::Insert("\n".into()))
        );
        assert_eq!(
            route(false, Modifiers::none(), Key::Named(NamedKey::Tab), Some("\t")),
            KeyRoute::Edit(EditKey::Insert("\t".into()))
        );
    }
}
