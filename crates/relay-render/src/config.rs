use serde::{Deserialize, Serialize};

/// Renderer-core configuration.
///
/// Deserializable so hosts can keep it in their own config files; every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Debug label applied to every view the translator renders into.
    pub view_name: String,

    /// Clear color (`0xRRGGBBAA`) for secondary viewports that do not opt
    /// out of renderer clears.
    pub viewport_clear_color: u32,

    /// First view id handed to secondary viewports. Ids below it stay with
    /// the main view and host passes.
    pub first_dynamic_view: u16,

    /// Last view id the backend supports.
    pub max_view_id: u16,

    /// Skip the destroy/create cycle when a resize leaves the pixel size as is.
    pub skip_unchanged_resize: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            view_name: "relay".to_string(),
            viewport_clear_color: 0x0000_00ff,
            first_dynamic_view: 100,
            max_view_id: 255,
            skip_unchanged_resize: true,
        }
    }
}
