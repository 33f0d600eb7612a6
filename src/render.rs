//! Frame building - turns the workspace into rects and glyph quads
//!
//! Everything here is in physical pixels. A frame is a list of layers drawn
//! in order; each layer draws its rects first, then its glyphs.

use crate::document::Document;
use crate::font::{GlyphAtlas, LineMetrics};
use crate::prompt::PromptState;
use crate::session::Session;
use crate::theme::Theme;
use crate::workspace::Workspace;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RectInstance {
    pub rect: Rect,
    pub color: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInstance {
    pub rect: Rect,
    pub tex_coords: [f32; 4],
    pub color: u32,
}

#[derive(Default, Debug)]
pub struct Layer {
    pub rects: Vec<RectInstance>,
    pub glyphs: Vec<GlyphInstance>,
}

impl Layer {
    pub fn fill(&mut self, rect: Rect, color: u32) {
        if rect.width > 0.0 && rect.height > 0.0 {
            self.rects.push(RectInstance { rect, color });
        }
    }

    /// Lay out a single line of text at a baseline. Returns the pen x at the end.
    pub fn text(
        &mut self,
        atlas: &mut GlyphAtlas,
        text: &str,
        x: f32,
        baseline: f32,
        max_x: f32,
        color: u32,
    ) -> f32 {
        let mut pen = x;
        for ch in text.chars() {
            let advance = atlas.advance(ch);
            if pen + advance > max_x {
                break;
            }
            if !ch.is_whitespace() && !ch.is_control() {
                let glyph = atlas.glyph(ch);
                if glyph.width > 0.0 {
                    self.glyphs.push(GlyphInstance {
                        rect: Rect::new(
                            (pen + glyph.xmin).round(),
                            (baseline - glyph.ymin - glyph.height).round(),
                            glyph.width,
                            glyph.height,
                        ),
                        tex_coords: glyph.tex_coords,
                        color,
                    });
                }
            }
            pen += advance;
        }
        pen
    }
}

/// Message shown in the status bar until the next key press
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Screen regions for a viewport
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub metrics: LineMetrics,
}

impl Layout {
    pub fn new(width: f32, height: f32, scale_factor: f32, metrics: LineMetrics) -> Self {
        Self {
            width,
            height,
            padding: (8.0 * scale_factor).round(),
            metrics,
        }
    }

    fn bar_height(&self) -> f32 {
        self.metrics.line_height + self.padding
    }

    pub fn tab_bar(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.bar_height())
    }

    pub fn status_bar(&self) -> Rect {
        let h = self.bar_height();
        Rect::new(0.0, (self.height - h).max(0.0), self.width, h)
    }

    pub fn text_area(&self) -> Rect {
        let top = self.tab_bar().bottom();
        let bottom = self.status_bar().y;
        Rect::new(
            self.padding,
            top + self.padding / 2.0,
            (self.width - self.padding * 2.0).max(0.0),
            (bottom - top - self.padding / 2.0).max(0.0),
        )
    }

    pub fn visible_lines(&self) -> usize {
        ((self.text_area().height / self.metrics.line_height).floor() as usize).max(1)
    }

    /// Document line under a y coordinate
    pub fn line_at(&self, y: f32, scroll_line: usize) -> usize {
        let area = self.text_area();
        let row = ((y - area.y).max(0.0) / self.metrics.line_height).floor() as usize;
        scroll_line + row
    }
}

/// Smallest scroll change that keeps `cursor_line` on screen
pub fn scroll_to_cursor(scroll_line: usize, cursor_line: usize, visible_lines: usize) -> usize {
    if cursor_line < scroll_line {
        cursor_line
    } else if cursor_line >= scroll_line + visible_lines {
        cursor_line + 1 - visible_lines
    } else {
        scroll_line
    }
}

/// (line, column) under a point in the text area
pub fn hit_test(
    layout: &Layout,
    atlas: &mut GlyphAtlas,
    document: &Document,
    scroll_line: usize,
    x: f32,
    y: f32,
) -> (usize, usize) {
    let line = layout
        .line_at(y, scroll_line)
        .min(document.line_count() - 1);
    let column = atlas.column_at(document.line(line), x - layout.text_area().x);
    (line, column)
}

pub struct FrameContext<'a> {
    pub workspace: &'a Workspace,
    pub theme: &'a Theme,
    pub layout: Layout,
    pub scroll_line: usize,
    pub prompt: Option<&'a PromptState>,
    pub status: Option<&'a StatusMessage>,
}

/// Build every layer of a frame
pub fn build_frame(ctx: &FrameContext, atlas: &mut GlyphAtlas) -> Vec<Layer> {
    let generation = atlas.generation();
    let layers = build_layers(ctx, atlas);
    if atlas.generation() == generation {
        return layers;
    }

    // The atlas filled up mid-frame; glyphs placed before the reset point at freed space
    tracing::debug!("Rebuilding frame after atlas reset");
    build_layers(ctx, atlas)
}

fn build_layers(ctx: &FrameContext, atlas: &mut GlyphAtlas) -> Vec<Layer> {
    let mut base = Layer::default();
    draw_tab_bar(&mut base, ctx, atlas);
    draw_document(&mut base, ctx, atlas);
    draw_status_bar(&mut base, ctx, atlas);

    let mut layers = vec![base];
    if let Some(prompt) = ctx.prompt {
        let mut overlay = Layer::default();
        draw_prompt(&mut overlay, ctx, atlas, prompt);
        layers.push(overlay);
    }
    layers
}

fn tab_label(tab: &Session) -> String {
    if tab.is_modified() {
        format!("{} *", tab.display_name())
    } else {
        tab.display_name()
    }
}

/// Horizontal extent and label of every tab, left to right
fn tab_spans(workspace: &Workspace, atlas: &mut GlyphAtlas, padding: f32) -> Vec<(f32, f32, String)> {
    let mut x = 0.0;
    workspace
        .tabs()
        .iter()
        .map(|tab| {
            let label = tab_label(tab);
            let width = atlas.measure(&label) + padding * 2.0;
            let span = (x, width, label);
            x += width + 1.0;
            span
        })
        .collect()
}

/// Tab under a point in the tab bar
pub fn tab_at(
    layout: &Layout,
    atlas: &mut GlyphAtlas,
    workspace: &Workspace,
    x: f32,
    y: f32,
) -> Option<usize> {
    if !layout.tab_bar().contains(x, y) {
        return None;
    }
    tab_spans(workspace, atlas, layout.padding)
        .iter()
        .position(|(start, width, _)| x >= *start && x < start + width)
}

fn draw_tab_bar(layer: &mut Layer, ctx: &FrameContext, atlas: &mut GlyphAtlas) {
    let bar = ctx.layout.tab_bar();
    let padding = ctx.layout.padding;
    let baseline = bar.y + padding / 2.0 + ctx.layout.metrics.ascent;
    layer.fill(bar, ctx.theme.tab_bar);

    for (index, (x, width, label)) in tab_spans(ctx.workspace, atlas, padding).into_iter().enumerate() {
        if x >= bar.width {
            break;
        }
        if index == ctx.workspace.active_index() {
            layer.fill(Rect::new(x, bar.y, width, bar.height), ctx.theme.tab_active);
        }
        layer.text(atlas, &label, x + padding, baseline, bar.right(), ctx.theme.tab_text);
    }
}

fn draw_document(layer: &mut Layer, ctx: &FrameContext, atlas: &mut GlyphAtlas) {
    let area = ctx.layout.text_area();
    let line_height = ctx.layout.metrics.line_height;
    let document = ctx.workspace.active().document();
    let selection = document.selection();
    let (cursor_line, cursor_column) = document.cursor_position();

    let first = ctx.scroll_line.min(document.line_count() - 1);
    let last = (first + ctx.layout.visible_lines()).min(document.line_count());

    for line in first..last {
        let top = area.y + (line - first) as f32 * line_height;
        let text = document.line(line);
        let start = document.line_start(line);
        let end = document.line_end(line);

        // Selection behind the text
        if document.has_selection() && selection.start <= end && selection.end >= start {
            let from = selection.start.max(start) - start;
            let to = selection.end.min(end) - start;
            let x0 = area.x + atlas.measure(&text[..from]);
            let mut x1 = area.x + atlas.measure(&text[..to]);
            // Show the selected newline
            if selection.end > end {
                x1 += atlas.advance(' ');
            }
            layer.fill(
                Rect::new(x0, top, (x1.min(area.right()) - x0).max(0.0), line_height),
                ctx.theme.selection,
            );
        }

        let baseline = top + ctx.layout.metrics.ascent;
        layer.text(atlas, text, area.x, baseline, area.right(), ctx.theme.text);

        if line == cursor_line && ctx.prompt.is_none() {
            let prefix: String = text.chars().take(cursor_column).collect();
            let x = area.x + atlas.measure(&prefix);
            let width = (ctx.layout.padding / 4.0).max(1.0);
            layer.fill(Rect::new(x, top, width, line_height), ctx.theme.cursor);
        }
    }
}

fn draw_status_bar(layer: &mut Layer, ctx: &FrameContext, atlas: &mut GlyphAtlas) {
    let bar = ctx.layout.status_bar();
    let padding = ctx.layout.padding;
    let baseline = bar.y + padding / 2.0 + ctx.layout.metrics.ascent;
    layer.fill(bar, ctx.theme.status_bar);

    let session = ctx.workspace.active();
    let (line, column) = session.document().cursor_position();
    let position = format!("Ln {}, Col {}   UTF-8", line + 1, column + 1);
    let position_width = atlas.measure(&position);
    let position_x = (bar.right() - padding - position_width).max(padding);

    let (text, color) = match ctx.status {
        Some(message) if message.is_error => (message.text.clone(), ctx.theme.error_text),
        Some(message) => (message.text.clone(), ctx.theme.status_text),
        None => (
            session
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| session.display_name()),
            ctx.theme.status_text,
        ),
    };

    layer.text(atlas, &text, bar.x + padding, baseline, position_x - padding, color);
    layer.text(atlas, &position, position_x, baseline, bar.right(), ctx.theme.status_text);
}

fn draw_prompt(layer: &mut Layer, ctx: &FrameContext, atlas: &mut GlyphAtlas, prompt: &PromptState) {
    let padding = ctx.layout.padding;
    let line_height = ctx.layout.metrics.line_height;
    let ascent = ctx.layout.metrics.ascent;

    let rows = if prompt.input().is_some() { 3.0 } else { 2.0 };
    let width = (ctx.layout.width * 0.6).max(line_height * 16.0).min(ctx.layout.width);
    let height = rows * line_height + padding * (rows + 1.0);
    let x = ((ctx.layout.width - width) / 2.0).round();
    let y = ctx.layout.tab_bar().bottom() + padding * 2.0;

    let border = (padding / 4.0).max(1.0);
    layer.fill(
        Rect::new(x - border, y - border, width + border * 2.0, height + border * 2.0),
        ctx.theme.overlay_border,
    );
    layer.fill(Rect::new(x, y, width, height), ctx.theme.overlay_background);

    let max_x = x + width - padding;
    let mut row_top = y + padding;
    layer.text(atlas, &prompt.title(), x + padding, row_top + ascent, max_x, ctx.theme.text);
    row_top += line_height + padding;

    if let Some(input) = prompt.input() {
        let field = Rect::new(x + padding, row_top, width - padding * 2.0, line_height);
        layer.fill(field, ctx.theme.overlay_input);

        // Keep the end of long paths in view
        let mut visible = input;
        while !visible.is_empty() && atlas.measure(visible) > field.width - padding {
            let mut chars = visible.chars();
            chars.next();
            visible = chars.as_str();
        }
        let end = layer.text(atlas, visible, field.x, row_top + ascent, field.right(), ctx.theme.text);
        layer.fill(Rect::new(end, row_top, border, line_height), ctx.theme.cursor);
        row_top += line_height + padding;
    }

    layer.text(atlas, prompt.hint(), x + padding, row_top + ascent, max_x, ctx.theme.status_text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontConfig;
    use crate::font::load_fonts;
    use crate::session::SessionSettings;

    fn layout() -> Layout {
        Layout::new(
            800.0,
            600.0,
            1.0,
            LineMetrics {
                ascent: 14.0,
                line_height: 20.0,
            },
        )
    }

    #[test]
    fn test_regions_stack_vertically() {
        let layout = layout();
        let tabs = layout.tab_bar();
        let text = layout.text_area();
        let status = layout.status_bar();

        assert_eq!(tabs.y, 0.0);
        assert!(text.y >= tabs.bottom());
        assert!(text.bottom() <= status.y);
        assert_eq!(status.bottom(), 600.0);
        assert!(layout.visible_lines() > 20);
    }

    #[test]
    fn test_line_at() {
        let layout = layout();
        let top = layout.text_area().y;
        assert_eq!(layout.line_at(top + 1.0, 0), 0);
        assert_eq!(layout.line_at(top + 45.0, 0), 2);
        assert_eq!(layout.line_at(top + 45.0, 10), 12);
        assert_eq!(layout.line_at(0.0, 3), 3);
    }

    #[test]
    fn test_scroll_to_cursor() {
        assert_eq!(scroll_to_cursor(0, 5, 10), 0);
        assert_eq!(scroll_to_cursor(0, 10, 10), 1);
        assert_eq!(scroll_to_cursor(20, 4, 10), 4);
        assert_eq!(scroll_to_cursor(3, 12, 10), 3);
    }

    #[test]
    fn test_empty_rects_are_skipped() {
        let mut layer = Layer::default();
        layer.fill(Rect::new(0.0, 0.0, 0.0, 10.0), 0xFFFFFFFF);
        layer.fill(Rect::new(0.0, 0.0, 10.0, 10.0), 0xFFFFFFFF);
        assert_eq!(layer.rects.len(), 1);
    }

    #[test]
    fn test_frame_rebuilt_after_atlas_reset() {
        // Needs a system font; nothing to check on machines without one
        let Ok(fonts) = load_fonts(&FontConfig::default()) else {
            return;
        };
        let mut atlas = GlyphAtlas::with_atlas_size(fonts, 16.0, 128);
        let row = atlas.line_metrics().line_height as u32 + 2;

        // Fill the atlas until the frame's glyphs can no longer fit
        for ch in ('\u{c0}'..='\u{ff}').chain('\u{100}'..='\u{17e}') {
            if atlas.remaining_height() < row {
                break;
            }
            atlas.glyph(ch);
        }
        assert_eq!(atlas.generation(), 0);

        let mut workspace = Workspace::new(SessionSettings::default());
        workspace
            .active_mut()
            .insert("the quick brown fox\njumps over the lazy dog\n0123456789");
        let theme = Theme::dark();
        let ctx = FrameContext {
            workspace: &workspace,
            theme: &theme,
            layout: Layout::new(800.0, 600.0, 1.0, atlas.line_metrics()),
            scroll_line: 0,
            prompt: None,
            status: None,
        };

        let first = build_frame(&ctx, &mut atlas);
        assert_eq!(atlas.generation(), 1);

        let second = build_frame(&ctx, &mut atlas);
        assert_eq!(atlas.generation(), 1);
        assert_eq!(first[0].glyphs, second[0].glyphs);
    }
}
