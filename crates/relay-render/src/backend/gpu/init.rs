/// Initialization parameters for [`WgpuBackend`](super::WgpuBackend).
#[derive(Debug, Clone)]
pub struct WgpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// GUI vertex colors are authored in gamma space, so the default is a
    /// linear (non-sRGB) surface.
    pub prefer_srgb: bool,

    /// Present mode for the main surface and every frame buffer.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference.
    ///
    /// If provided but unsupported on a surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for each surface. A hint.
    pub desired_maximum_frame_latency: u32,

    /// Per-frame capacity of the transient vertex pool, in bytes.
    pub transient_vertex_bytes: u32,

    /// Per-frame capacity of the transient index pool, in bytes.
    pub transient_index_bytes: u32,

    /// Largest view id the backend accepts.
    pub max_view_id: u16,
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            transient_vertex_bytes: 6 << 20,
            transient_index_bytes: 2 << 20,
            max_view_id: 255,
        }
    }
}
