//! The renderer entry point a host talks to.

use bitflags::bitflags;

use crate::backend::{GraphicsBackend, ViewId};
use crate::config::RendererConfig;
use crate::coords::Vec2;
use crate::device::{DeviceObjects, FontAtlas};
use crate::draw::DrawData;
use crate::frame::{render_draw_data, FrameStats, ViewSetup};
use crate::viewport::{NativeHandleResolver, Viewport, ViewportId, ViewportManager, ViewportState};

pub const RENDERER_NAME: &str = "relay-render";

bitflags! {
    /// Features the renderer offers to the GUI layer.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct BackendCapabilities: u32 {
        /// Spans may carry a non-zero `vtx_offset`.
        const HAS_VTX_OFFSET = 1 << 0;
        /// Secondary viewport windows get their own render targets.
        const HAS_VIEWPORTS = 1 << 1;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BackendInfo {
    pub renderer_name: &'static str,
    pub capabilities: BackendCapabilities,
}

/// Owns the backend and all renderer state.
///
/// Each instance is independent; nothing is process-wide. Calls must be
/// serialized by the host (one frame, one viewport at a time).
pub struct RenderContext<B: GraphicsBackend> {
    backend: B,
    device: DeviceObjects,
    viewports: ViewportManager,
    main_view: ViewId,
    resolver: Box<dyn NativeHandleResolver<B::NativeWindow>>,
    config: RendererConfig,
}

impl<B: GraphicsBackend> RenderContext<B> {
    /// `main_view` receives [`render_main`](Self::render_main); `resolver`
    /// turns viewport platform tokens into native windows for `backend`.
    ///
    /// `config.max_view_id` is lowered to the backend's last view id if it
    /// exceeds it. A dynamic range left empty is logged and every viewport
    /// then stays `Uninitialized`.
    pub fn new(
        backend: B,
        main_view: ViewId,
        resolver: impl NativeHandleResolver<B::NativeWindow> + 'static,
        mut config: RendererConfig,
    ) -> Self {
        let backend_max = backend.caps().max_view_id;
        if config.max_view_id > backend_max {
            log::warn!(
                "max_view_id {} exceeds the backend's last view id {backend_max}; clamped",
                config.max_view_id
            );
            config.max_view_id = backend_max;
        }
        if config.first_dynamic_view > config.max_view_id {
            log::warn!(
                "dynamic view range {}..={} is empty; secondary viewports are disabled",
                config.first_dynamic_view,
                config.max_view_id
            );
        }
        if main_view.get() >= config.first_dynamic_view {
            log::warn!(
                "main {main_view} lies in the dynamic range starting at {}",
                config.first_dynamic_view
            );
        }
        log::info!("{RENDERER_NAME} initialized on {main_view}");
        Self {
            backend,
            device: DeviceObjects::new(),
            viewports: ViewportManager::new(&config),
            main_view,
            resolver: Box::new(resolver),
            config,
        }
    }

    pub fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            renderer_name: RENDERER_NAME,
            capabilities: BackendCapabilities::HAS_VTX_OFFSET | BackendCapabilities::HAS_VIEWPORTS,
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn device(&self) -> &DeviceObjects {
        &self.device
    }

    #[inline]
    pub fn viewports(&self) -> &ViewportManager {
        &self.viewports
    }

    #[inline]
    pub fn main_view(&self) -> ViewId {
        self.main_view
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Once-per-frame hook run before any drawing. Returns whether the
    /// device objects are ready.
    pub fn new_frame(&mut self, atlas: &mut dyn FontAtlas) -> bool {
        self.device.ensure_ready(&mut self.backend, atlas)
    }

    /// Translates `draw_data` into the main view.
    pub fn render_main(&mut self, draw_data: &DrawData, clear: Option<u32>) -> FrameStats {
        self.render(self.main_view, draw_data, clear)
    }

    /// Translates `draw_data` into `view`.
    pub fn render(&mut self, view: ViewId, draw_data: &DrawData, clear: Option<u32>) -> FrameStats {
        let setup = ViewSetup {
            view,
            name: &self.config.view_name,
            clear,
        };
        render_draw_data(&mut self.backend, &self.device, setup, draw_data)
    }

    // ── viewport callbacks ────────────────────────────────────────────────

    pub fn on_create_window(&mut self, viewport: &Viewport<'_>) -> ViewportState {
        self.viewports
            .on_create(&mut self.backend, self.resolver.as_ref(), viewport)
    }

    pub fn on_destroy_window(&mut self, id: ViewportId) -> ViewportState {
        self.viewports.on_destroy(&mut self.backend, id)
    }

    pub fn on_set_window_size(&mut self, viewport: &Viewport<'_>, size: Vec2) -> ViewportState {
        self.viewports
            .on_resize(&mut self.backend, self.resolver.as_ref(), viewport, size)
    }

    pub fn on_render_window(&mut self, viewport: &Viewport<'_>) -> Option<FrameStats> {
        self.viewports
            .on_render(&mut self.backend, &self.device, viewport, &self.config.view_name)
    }

    /// Executes the frame on the backend.
    pub fn frame(&mut self) -> u64 {
        self.backend.frame()
    }

    /// Releases every viewport target and the device objects. The context
    /// can be reused; the next [`new_frame`](Self::new_frame) recreates them.
    pub fn shutdown(&mut self, atlas: &mut dyn FontAtlas) {
        self.viewports.destroy_all(&mut self.backend);
        self.device.teardown(&mut self.backend, Some(atlas));
        log::info!("{RENDERER_NAME} shut down");
    }

    /// Consumes the context, returning the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Caps, RecordingBackend};
    use crate::device::RgbaAtlas;
    use crate::draw::DrawList;
    use crate::viewport::{Headless, PassThrough};

    fn context() -> RenderContext<RecordingBackend> {
        RenderContext::new(RecordingBackend::new(), ViewId(0), PassThrough, RendererConfig::default())
    }

    fn frame() -> DrawData {
        let mut list = DrawList::new();
        list.add_rect_filled(Vec2::new(10.0, 10.0), Vec2::new(50.0, 50.0), 0xffff_ffff);
        let mut data = DrawData::new(Vec2::zero(), Vec2::new(800.0, 600.0), Vec2::splat(1.0));
        data.lists.push(list);
        data
    }

    #[test]
    fn declares_vtx_offset_and_viewports() {
        let info = context().backend_info();
        assert_eq!(info.renderer_name, "relay-render");
        assert!(info.capabilities.contains(BackendCapabilities::HAS_VTX_OFFSET));
        assert!(info.capabilities.contains(BackendCapabilities::HAS_VIEWPORTS));
    }

    #[test]
    fn nothing_draws_before_new_frame() {
        let mut ctx = context();

        let stats = ctx.render_main(&frame(), Some(0x3030_30ff));

        assert_eq!(stats.draw_calls, 0);
        assert!(ctx.backend().calls().is_empty());
    }

    #[test]
    fn main_view_receives_draws_after_new_frame() {
        let mut ctx = context();
        let mut atlas = RgbaAtlas::white();

        assert!(ctx.new_frame(&mut atlas));
        let stats = ctx.render_main(&frame(), None);

        assert_eq!(stats.draw_calls, 1);
        assert!(ctx.backend().submits().all(|d| d.view == ViewId(0)));
    }

    #[test]
    fn viewports_render_into_their_own_view() {
        let mut ctx = context();
        let mut atlas = RgbaAtlas::white();
        ctx.new_frame(&mut atlas);
        let data = frame();
        let vp = Viewport::new(ViewportId(7), Some(7), Vec2::new(800.0, 600.0), 1.0);

        assert_eq!(ctx.on_create_window(&vp), ViewportState::FrameBufferReady);
        let stats = ctx.on_render_window(&vp.with_draw_data(&data)).unwrap();

        assert_eq!(stats.draw_calls, 1);
        assert!(ctx.backend().submits().all(|d| d.view == ViewId(100)));
    }

    #[test]
    fn headless_context_never_creates_targets() {
        let mut ctx = RenderContext::new(RecordingBackend::new(), ViewId(0), Headless, RendererConfig::default());
        let vp = Viewport::new(ViewportId(1), Some(1), Vec2::new(100.0, 100.0), 1.0);

        assert_eq!(ctx.on_create_window(&vp), ViewportState::Uninitialized);
        assert_eq!(ctx.backend().live_frame_buffers(), 0);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut ctx = context();
        let mut atlas = RgbaAtlas::white();
        ctx.new_frame(&mut atlas);
        let vp = Viewport::new(ViewportId(1), Some(1), Vec2::new(100.0, 100.0), 1.0);
        ctx.on_create_window(&vp);

        ctx.shutdown(&mut atlas);

        let backend = ctx.backend();
        assert_eq!(backend.live_frame_buffers(), 0);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(atlas.texture_id(), None);
        assert!(!ctx.device().is_ready());
    }

    // ── view range ────────────────────────────────────────────────────────

    #[test]
    fn view_range_is_clamped_to_backend() {
        let backend = RecordingBackend::new().with_caps(Caps {
            homogeneous_depth: false,
            max_view_id: 100,
        });
        let mut ctx = RenderContext::new(backend, ViewId(0), PassThrough, RendererConfig::default());
        let first = Viewport::new(ViewportId(1), Some(1), Vec2::new(100.0, 100.0), 1.0);
        let second = Viewport::new(ViewportId(2), Some(2), Vec2::new(100.0, 100.0), 1.0);

        assert_eq!(ctx.config().max_view_id, 100);
        assert_eq!(ctx.on_create_window(&first), ViewportState::FrameBufferReady);
        assert_eq!(ctx.viewports().record(ViewportId(1)).unwrap().view_id, ViewId(100));
        assert_eq!(ctx.on_create_window(&second), ViewportState::Uninitialized);
        assert_eq!(ctx.backend().live_frame_buffers(), 1);
    }

    #[test]
    fn inverted_view_range_disables_viewports() {
        let config = RendererConfig {
            first_dynamic_view: 300,
            max_view_id: 255,
            ..RendererConfig::default()
        };
        let mut ctx = RenderContext::new(RecordingBackend::new(), ViewId(0), PassThrough, config);
        let vp = Viewport::new(ViewportId(1), Some(1), Vec2::new(100.0, 100.0), 1.0);

        assert_eq!(ctx.on_create_window(&vp), ViewportState::Uninitialized);
        assert_eq!(ctx.backend().live_frame_buffers(), 0);
    }
}
