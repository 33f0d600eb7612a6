//! Color themes for the editor chrome and text
//!
//! Colors are packed 0xRRGGBBAA, the layout the shaders unpack.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub background: u32,
    pub text: u32,
    pub selection: u32,
    pub cursor: u32,
    pub tab_bar: u32,
    pub tab_active: u32,
    pub tab_text: u32,
    pub status_bar: u32,
    pub status_text: u32,
    pub error_text: u32,
    pub overlay_background: u32,
    pub overlay_border: u32,
    pub overlay_input: u32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            background: 0x1E1F22FF,
            text: 0xDCDFE4FF,
            selection: 0x3D5A8080,
            cursor: 0xF0F0F0FF,
            tab_bar: 0x17181AFF,
            tab_active: 0x2B2D31FF,
            tab_text: 0xB5BAC1FF,
            status_bar: 0x2B2D31FF,
            status_text: 0xB5BAC1FF,
            error_text: 0xF28B82FF,
            overlay_background: 0x313338F0,
            overlay_border: 0x5865F2FF,
            overlay_input: 0x1E1F22FF,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light",
            background: 0xFFFFFFFF,
            text: 0x1F2328FF,
            selection: 0xB6D7FF99,
            cursor: 0x1F2328FF,
            tab_bar: 0xE6E8EBFF,
            tab_active: 0xFFFFFFFF,
            tab_text: 0x3C4149FF,
            status_bar: 0xF0F1F3FF,
            status_text: 0x3C4149FF,
            error_text: 0xC5221FFF,
            overlay_background: 0xF6F8FAF0,
            overlay_border: 0x0969DAFF,
            overlay_input: 0xFFFFFFFF,
        }
    }

    /// Theme by config name; unknown names fall back to dark
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!("Unknown theme '{}', using dark", other);
                Self::dark()
            }
        }
    }

    /// Background as a wgpu clear color
    pub fn clear_color(&self) -> [f64; 4] {
        let c = self.background;
        [
            ((c >> 24) & 0xFF) as f64 / 255.0,
            ((c >> 16) & 0xFF) as f64 / 255.0,
            ((c >> 8) & 0xFF) as f64 / 255.0,
            (c & 0xFF) as f64 / 255.0,
        ]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("Light").name, "light");
        assert_eq!(Theme::by_name("dark").name, "dark");
        assert_eq!(Theme::by_name("solarized").name, "dark");
    }

    #[test]
    fn test_clear_color_unpacks_rgba() {
        let mut theme = Theme::dark();
        theme.background = 0xFF000080;
        let [r, g, b, a] = theme.clear_color();
        assert_eq!((r, g, b), (1.0, 0.0, 0.0));
        assert!((a - 128.0 / 255.0).abs() < 1e-9);
    }
}
