use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relay_render::RendererConfig;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "relay-studio.toml";

/// Host settings read from `relay-studio.toml`.
///
/// The file is optional; a missing file yields the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    /// `env_logger` filter string. `RUST_LOG` applies when unset.
    pub log_filter: Option<String>,
    /// TrueType/OpenType font for the glyph atlas. Without one the studio
    /// renders untextured geometry only.
    pub font: Option<PathBuf>,
    pub font_size: f32,
    pub renderer: RendererConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "relay studio".to_string(),
            width: 1280.0,
            height: 720.0,
            log_filter: None,
            font: None,
            font_size: 16.0,
            renderer: RendererConfig::default(),
        }
    }
}

impl StudioConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(StudioConfig::parse("").unwrap(), StudioConfig::default());
    }

    #[test]
    fn renderer_table_is_nested() {
        let cfg = StudioConfig::parse(
            r#"
            title = "demo"
            width = 800.0

            [renderer]
            first_dynamic_view = 10
            skip_unchanged_resize = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.title, "demo");
        assert_eq!(cfg.width, 800.0);
        assert_eq!(cfg.height, 720.0);
        assert_eq!(cfg.renderer.first_dynamic_view, 10);
        assert!(!cfg.renderer.skip_unchanged_resize);
        assert_eq!(cfg.renderer.max_view_id, 255);
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = StudioConfig::load(Path::new("/nonexistent/relay-studio.toml")).unwrap();
        assert_eq!(cfg, StudioConfig::default());
    }

    #[test]
    fn bad_types_are_reported() {
        assert!(StudioConfig::parse("width = \"wide\"").is_err());
    }
}
