//! Font loading, glyph rasterization and atlas management
//!
//! One primary monospace font plus optional fallbacks (CJK and the like).
//! Glyphs are rasterized with fontdue at a single pixel size into an R8
//! atlas that the GPU samples.

use crate::config::FontConfig;
use crate::error::{NotepadError, Result};
use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_ATLAS_SIZE: u32 = 1024;
const TAB_WIDTH: f32 = 4.0;

#[cfg(target_os = "macos")]
const SYSTEM_FONTS: &[&str] = &[
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/System/Library/Fonts/Supplemental/Courier New.ttf",
];
#[cfg(target_os = "windows")]
const SYSTEM_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
];

#[cfg(target_os = "macos")]
const FALLBACK_FONTS: &[&str] = &["/System/Library/Fonts/AppleSDGothicNeo.ttc"];
#[cfg(target_os = "windows")]
const FALLBACK_FONTS: &[&str] = &["C:\\Windows\\Fonts\\malgun.ttf"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/nanum/NanumGothicCoding.ttf",
];

/// Rasterized glyph placement
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphEntry {
    /// Texture coordinates in atlas [u0, v0, u1, v1]
    pub tex_coords: [f32; 4],
    pub width: f32,
    pub height: f32,
    /// Offset of the bitmap's left edge from the pen position
    pub xmin: f32,
    /// Offset of the bitmap's bottom edge from the baseline (up is positive)
    pub ymin: f32,
    pub advance: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct LineMetrics {
    pub ascent: f32,
    pub line_height: f32,
}

pub struct GlyphAtlas {
    /// Primary font first, fallbacks after
    fonts: Vec<Font>,
    size_px: f32,
    /// Atlas edge in pixels (square)
    size: u32,
    atlas_data: Vec<u8>,
    glyph_cache: HashMap<char, GlyphEntry>,
    next_x: u32,
    next_y: u32,
    row_height: u32,
    /// Atlas changed since the last upload
    dirty: bool,
    /// Bumped on every reset; cached tex coords from an older generation are stale
    generation: u64,
}

/// Fonts to try: the configured path, or the platform's usual monospace fonts
pub fn primary_candidates(config: &FontConfig) -> Vec<PathBuf> {
    match &config.path {
        Some(path) => vec![path.clone()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    }
}

fn read_font(path: &Path) -> Result<Font> {
    let bytes = std::fs::read(path).map_err(|e| NotepadError::from_io(path, e))?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| NotepadError::Font(format!("{}: {}", path.display(), e)))
}

/// Load the first usable primary font and every available fallback
pub fn load_fonts(config: &FontConfig) -> Result<Vec<Font>> {
    let candidates = primary_candidates(config);
    let primary = candidates
        .iter()
        .filter(|path| path.exists())
        .find_map(|path| match read_font(path) {
            Ok(font) => {
                tracing::info!(path = %path.display(), "Loaded font");
                Some(font)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .ok_or_else(|| {
            NotepadError::Font(format!(
                "no usable font found (tried {}); set [font] path in the config",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

    let mut fonts = vec![primary];
    for path in FALLBACK_FONTS.iter().map(Path::new).filter(|p| p.exists()) {
        match read_font(path) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), "Loaded fallback font");
                fonts.push(font);
            }
            Err(e) => tracing::debug!("Skipping fallback font: {}", e),
        }
    }

    Ok(fonts)
}

impl GlyphAtlas {
    pub fn new(fonts: Vec<Font>, size_px: f32) -> Self {
        Self::with_atlas_size(fonts, size_px, DEFAULT_ATLAS_SIZE)
    }

    pub fn with_atlas_size(fonts: Vec<Font>, size_px: f32, atlas_size: u32) -> Self {
        Self {
            fonts,
            size_px,
            size: atlas_size,
            atlas_data: vec![0; (atlas_size * atlas_size) as usize],
            glyph_cache: HashMap::new(),
            next_x: 0,
            next_y: 0,
            row_height: 0,
            dirty: true,
            generation: 0,
        }
    }

    /// Load the first usable primary font and every available fallback
    pub fn load(config: &FontConfig, size_px: f32) -> Result<Self> {
        Ok(Self::new(load_fonts(config)?, size_px))
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Change the raster size (e.g. on a scale factor change). Clears the atlas.
    pub fn set_size(&mut self, size_px: f32) {
        if (size_px - self.size_px).abs() > f32::EPSILON {
            self.size_px = size_px;
            self.clear();
        }
    }

    fn clear(&mut self) {
        self.atlas_data.fill(0);
        self.glyph_cache.clear();
        self.next_x = 0;
        self.next_y = 0;
        self.row_height = 0;
        self.dirty = true;
        self.generation += 1;
    }

    /// Number of atlas resets so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Free rows below the current shelf
    pub fn remaining_height(&self) -> u32 {
        self.size.saturating_sub(self.next_y + self.row_height)
    }

    pub fn line_metrics(&self) -> LineMetrics {
        match self.fonts[0].horizontal_line_metrics(self.size_px) {
            Some(m) => LineMetrics {
                ascent: m.ascent.ceil(),
                line_height: m.new_line_size.ceil(),
            },
            None => LineMetrics {
                ascent: self.size_px.ceil(),
                line_height: (self.size_px * 1.3).ceil(),
            },
        }
    }

    /// Horizontal advance of a char, tabs included
    pub fn advance(&mut self, ch: char) -> f32 {
        match ch {
            '\t' => self.glyph(' ').advance * TAB_WIDTH,
            c if c.is_control() => 0.0,
            c => self.glyph(c).advance,
        }
    }

    pub fn measure(&mut self, text: &str) -> f32 {
        text.chars().map(|c| self.advance(c)).sum()
    }

    /// Column whose left half contains `x`
    pub fn column_at(&mut self, text: &str, x: f32) -> usize {
        let mut pen = 0.0;
        for (column, ch) in text.chars().enumerate() {
            let advance = self.advance(ch);
            if x < pen + advance / 2.0 {
                return column;
            }
            pen += advance;
        }
        text.chars().count()
    }

    fn font_for(&self, ch: char) -> &Font {
        self.fonts
            .iter()
            .find(|font| font.lookup_glyph_index(ch) != 0)
            .unwrap_or(&self.fonts[0])
    }

    /// Get or rasterize a glyph
    pub fn glyph(&mut self, ch: char) -> GlyphEntry {
        if let Some(&entry) = self.glyph_cache.get(&ch) {
            return entry;
        }

        let (metrics, bitmap) = self.font_for(ch).rasterize(ch, self.size_px);
        let (width, height) = (metrics.width as u32, metrics.height as u32);

        // Wrap to the next row
        if self.next_x + width > self.size {
            self.next_x = 0;
            self.next_y += self.row_height;
            self.row_height = 0;
        }

        // Full: start over; glyphs are re-rasterized on demand
        if self.next_y + height > self.size {
            tracing::debug!(glyphs = self.glyph_cache.len(), "Glyph atlas full, resetting");
            self.clear();
        }

        for y in 0..height {
            let row_start = ((self.next_y + y) * self.size + self.next_x) as usize;
            let src = (y * width) as usize;
            self.atlas_data[row_start..row_start + width as usize]
                .copy_from_slice(&bitmap[src..src + width as usize]);
        }

        let atlas = self.size as f32;
        let entry = GlyphEntry {
            tex_coords: [
                self.next_x as f32 / atlas,
                self.next_y as f32 / atlas,
                (self.next_x + width) as f32 / atlas,
                (self.next_y + height) as f32 / atlas,
            ],
            width: width as f32,
            height: height as f32,
            xmin: metrics.xmin as f32,
            ymin: metrics.ymin as f32,
            advance: metrics.advance_width,
        };

        // 1px padding
        self.next_x += width + 1;
        self.row_height = self.row_height.max(height + 1);
        self.dirty = true;

        self.glyph_cache.insert(ch, entry);
        entry
    }

    /// Pre-rasterize printable ASCII
    pub fn prerasterize_ascii(&mut self) {
        for ch in ' '..='~' {
            self.glyph(ch);
        }
    }

    pub fn atlas_data(&self) -> &[u8] {
        &self.atlas_data
    }

    pub fn atlas_size(&self) -> (u32, u32) {
        (self.size, self.size)
    }

    /// True once after each atlas change
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_atlas() -> Option<GlyphAtlas> {
        GlyphAtlas::load(&FontConfig::default(), 16.0).ok()
    }

    #[test]
    fn test_configured_path_is_the_only_candidate() {
        let config = FontConfig {
            path: Some(PathBuf::from("/nonexistent/font.ttf")),
        };
        assert_eq!(primary_candidates(&config), vec![PathBuf::from("/nonexistent/font.ttf")]);

        let err = GlyphAtlas::load(&config, 14.0).err().unwrap();
        assert!(matches!(err, NotepadError::Font(_)));
    }

    #[test]
    fn test_glyphs_are_cached_and_tabs_are_wide() {
        // Needs a system font; nothing to check on machines without one
        let Some(mut atlas) = system_atlas() else {
            return;
        };
        assert!(atlas.take_dirty());

        let first = atlas.glyph('A');
        assert!(atlas.take_dirty());
        let again = atlas.glyph('A');
        assert!(!atlas.take_dirty());
        assert_eq!(first.tex_coords, again.tex_coords);

        let space = atlas.advance(' ');
        assert!((atlas.advance('\t') - space * TAB_WIDTH).abs() < 0.01);
        assert_eq!(atlas.advance('\n'), 0.0);
    }

    #[test]
    fn test_column_at() {
        let Some(mut atlas) = system_atlas() else {
            return;
        };
        let w = atlas.advance('m');
        assert_eq!(atlas.column_at("mmm", 0.0), 0);
        assert_eq!(atlas.column_at("mmm", w * 1.6), 2);
        assert_eq!(atlas.column_at("mmm", w * 10.0), 3);
    }
}
