use std::collections::HashMap;

use crate::backend::{FrameBufferHandle, GraphicsBackend, ViewId};
use crate::config::RendererConfig;
use crate::coords::Vec2;
use crate::device::DeviceObjects;
use crate::error::{RenderError, Result};
use crate::frame::{render_draw_data, FrameStats, ViewSetup};
use crate::view_id::ViewIdAllocator;

use super::{NativeHandleResolver, Viewport, ViewportFlags, ViewportId};

/// Per-window lifecycle state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ViewportState {
    /// No render target; the window renders nothing.
    Uninitialized,
    /// Owns a view id and a frame buffer.
    FrameBufferReady,
    /// Its render target was just released. Only returned by
    /// [`ViewportManager::on_destroy`]; afterwards the window reads as
    /// `Uninitialized` and may be created again.
    Destroyed,
}

/// Render target owned by one ready viewport.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ViewportRecord {
    pub frame_buffer: FrameBufferHandle,
    pub view_id: ViewId,
    pub width: u16,
    pub height: u16,
}

/// Render targets of every secondary viewport, keyed by window identity.
#[derive(Debug)]
pub struct ViewportManager {
    ids: ViewIdAllocator,
    records: HashMap<ViewportId, ViewportRecord>,
    clear_color: u32,
    skip_unchanged_resize: bool,
}

impl ViewportManager {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            ids: ViewIdAllocator::new(config.first_dynamic_view, config.max_view_id),
            records: HashMap::new(),
            clear_color: config.viewport_clear_color,
            skip_unchanged_resize: config.skip_unchanged_resize,
        }
    }

    /// `FrameBufferReady` while a record exists, `Uninitialized` otherwise.
    /// Never `Destroyed`.
    pub fn state(&self, id: ViewportId) -> ViewportState {
        if self.records.contains_key(&id) {
            ViewportState::FrameBufferReady
        } else {
            ViewportState::Uninitialized
        }
    }

    pub fn record(&self, id: ViewportId) -> Option<&ViewportRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Window-create callback.
    ///
    /// Failures are logged and leave the window `Uninitialized` without
    /// holding a view id.
    pub fn on_create<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        resolver: &dyn NativeHandleResolver<B::NativeWindow>,
        viewport: &Viewport<'_>,
    ) -> ViewportState {
        if self.records.contains_key(&viewport.id) {
            log::warn!("{} already has a render target; create ignored", viewport.id);
            return ViewportState::FrameBufferReady;
        }

        match self.create_target(backend, resolver, viewport) {
            Ok(record) => {
                log::debug!(
                    "{} ready on {} ({}x{})",
                    viewport.id,
                    record.view_id,
                    record.width,
                    record.height
                );
                self.records.insert(viewport.id, record);
                ViewportState::FrameBufferReady
            }
            Err(e) => {
                log::warn!("{} not created: {e}", viewport.id);
                ViewportState::Uninitialized
            }
        }
    }

    fn create_target<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        resolver: &dyn NativeHandleResolver<B::NativeWindow>,
        viewport: &Viewport<'_>,
    ) -> Result<ViewportRecord> {
        if viewport.platform_handle.is_none() {
            return Err(RenderError::MissingNativeHandle(viewport.id));
        }
        let native = resolver
            .resolve(viewport)
            .ok_or(RenderError::MissingNativeHandle(viewport.id))?;

        let view_id = self.ids.allocate()?;
        let (width, height) = viewport.pixel_size();
        let frame_buffer = match backend.create_frame_buffer(native, width, height) {
            Ok(fb) => fb,
            Err(e) => {
                self.ids.free(view_id);
                return Err(e.into());
            }
        };
        backend.set_view_frame_buffer(view_id, frame_buffer);

        Ok(ViewportRecord {
            frame_buffer,
            view_id,
            width,
            height,
        })
    }

    /// Window-destroy callback. Idempotent.
    pub fn on_destroy<B: GraphicsBackend>(&mut self, backend: &mut B, id: ViewportId) -> ViewportState {
        let Some(record) = self.records.remove(&id) else {
            return ViewportState::Uninitialized;
        };
        self.release(backend, record);
        log::debug!("{id} destroyed, {} freed", record.view_id);
        ViewportState::Destroyed
    }

    fn release<B: GraphicsBackend>(&mut self, backend: &mut B, record: ViewportRecord) {
        self.ids.free(record.view_id);
        backend.set_view_frame_buffer(record.view_id, FrameBufferHandle::INVALID);
        backend.destroy_frame_buffer(record.frame_buffer);
    }

    /// Window-resize callback: destroy then create at `size`.
    ///
    /// With `skip_unchanged_resize` set, a resize that keeps the pixel size
    /// leaves the existing target in place.
    pub fn on_resize<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        resolver: &dyn NativeHandleResolver<B::NativeWindow>,
        viewport: &Viewport<'_>,
        size: Vec2,
    ) -> ViewportState {
        let resized = Viewport { size, ..*viewport };

        if self.skip_unchanged_resize {
            if let Some(record) = self.records.get(&viewport.id) {
                if (record.width, record.height) == resized.pixel_size() {
                    log::trace!("{} resize keeps {}x{}", viewport.id, record.width, record.height);
                    return ViewportState::FrameBufferReady;
                }
            }
        }

        self.on_destroy(backend, viewport.id);
        self.on_create(backend, resolver, &resized)
    }

    /// Window-render callback. `None` when the window has no render target
    /// or no draw data.
    pub fn on_render<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        device: &DeviceObjects,
        viewport: &Viewport<'_>,
        view_name: &str,
    ) -> Option<FrameStats> {
        let record = self.records.get(&viewport.id)?;
        let draw_data = viewport.draw_data?;

        let clear = (!viewport.flags.contains(ViewportFlags::NO_RENDERER_CLEAR)).then_some(self.clear_color);
        let setup = ViewSetup {
            view: record.view_id,
            name: view_name,
            clear,
        };
        Some(render_draw_data(backend, device, setup, draw_data))
    }

    /// Releases every remaining render target.
    pub fn destroy_all<B: GraphicsBackend>(&mut self, backend: &mut B) {
        let records: Vec<_> = self.records.drain().collect();
        for (id, record) in records {
            log::debug!("{id} released at shutdown");
            self.release(backend, record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};
    use crate::device::RgbaAtlas;
    use crate::draw::DrawData;
    use crate::viewport::{Headless, PassThrough};

    fn manager() -> ViewportManager {
        ViewportManager::new(&RendererConfig::default())
    }

    fn window(id: u64) -> Viewport<'static> {
        Viewport::new(ViewportId(id), Some(0xabc0 + id), Vec2::new(400.0, 300.0), 1.0)
    }

    // ── create / destroy ──────────────────────────────────────────────────

    #[test]
    fn create_binds_frame_buffer_to_fresh_view() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();

        let state = viewports.on_create(&mut backend, &PassThrough, &window(1));

        assert_eq!(state, ViewportState::FrameBufferReady);
        let record = *viewports.record(ViewportId(1)).unwrap();
        assert_eq!(record.view_id, ViewId(100));
        assert_eq!((record.width, record.height), (400, 300));
        assert!(backend
            .calls()
            .contains(&Call::SetViewFrameBuffer(ViewId(100), record.frame_buffer)));
    }

    #[test]
    fn create_scales_by_dpi() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        let vp = Viewport::new(ViewportId(1), Some(1), Vec2::new(400.5, 300.0), 2.0);

        viewports.on_create(&mut backend, &PassThrough, &vp);

        let record = viewports.record(ViewportId(1)).unwrap();
        assert_eq!((record.width, record.height), (801, 600));
    }

    #[test]
    fn missing_platform_handle_stays_uninitialized() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        let mut vp = window(1);
        vp.platform_handle = None;

        assert_eq!(
            viewports.on_create(&mut backend, &PassThrough, &vp),
            ViewportState::Uninitialized
        );
        assert!(backend.calls().is_empty());
        // No id was consumed.
        viewports.on_create(&mut backend, &PassThrough, &window(2));
        assert_eq!(viewports.record(ViewportId(2)).unwrap().view_id, ViewId(100));
    }

    #[test]
    fn unresolvable_handle_stays_uninitialized() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();

        let state = viewports.on_create(&mut backend, &Headless, &window(1));

        assert_eq!(state, ViewportState::Uninitialized);
        assert_eq!(viewports.state(ViewportId(1)), ViewportState::Uninitialized);
    }

    #[test]
    fn frame_buffer_failure_returns_view_id() {
        let mut backend = RecordingBackend::new();
        backend.fail_frame_buffers = true;
        let mut viewports = manager();

        assert_eq!(
            viewports.on_create(&mut backend, &PassThrough, &window(1)),
            ViewportState::Uninitialized
        );

        backend.fail_frame_buffers = false;
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        assert_eq!(viewports.record(ViewportId(1)).unwrap().view_id, ViewId(100));
    }

    #[test]
    fn exhausted_view_ids_leave_window_uninitialized() {
        let mut backend = RecordingBackend::new();
        let config = RendererConfig {
            first_dynamic_view: 100,
            max_view_id: 100,
            ..RendererConfig::default()
        };
        let mut viewports = ViewportManager::new(&config);

        viewports.on_create(&mut backend, &PassThrough, &window(1));
        let state = viewports.on_create(&mut backend, &PassThrough, &window(2));

        assert_eq!(state, ViewportState::Uninitialized);
        assert_eq!(backend.live_frame_buffers(), 1);
    }

    #[test]
    fn destroy_frees_id_and_target_once() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        viewports.on_create(&mut backend, &PassThrough, &window(2));

        assert_eq!(viewports.on_destroy(&mut backend, ViewportId(1)), ViewportState::Destroyed);
        assert_eq!(viewports.state(ViewportId(1)), ViewportState::Uninitialized);
        assert_eq!(viewports.on_destroy(&mut backend, ViewportId(1)), ViewportState::Uninitialized);
        assert_eq!(backend.live_frame_buffers(), 1);

        // Most recently freed id is reused first.
        viewports.on_create(&mut backend, &PassThrough, &window(3));
        assert_eq!(viewports.record(ViewportId(3)).unwrap().view_id, ViewId(100));
    }

    #[test]
    fn destroy_of_unknown_window_is_a_no_op() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();

        assert_eq!(viewports.on_destroy(&mut backend, ViewportId(9)), ViewportState::Uninitialized);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn second_create_keeps_existing_target() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));

        viewports.on_create(&mut backend, &PassThrough, &window(1));

        assert_eq!(backend.live_frame_buffers(), 1);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_recreates_target_at_new_size() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        let before = *viewports.record(ViewportId(1)).unwrap();

        let state = viewports.on_resize(&mut backend, &PassThrough, &window(1), Vec2::new(640.0, 480.0));

        assert_eq!(state, ViewportState::FrameBufferReady);
        let after = *viewports.record(ViewportId(1)).unwrap();
        assert_eq!((after.width, after.height), (640, 480));
        assert_eq!(after.view_id, before.view_id);
        assert!(!backend.is_frame_buffer_live(before.frame_buffer) || before.frame_buffer == after.frame_buffer);
        assert_eq!(backend.live_frame_buffers(), 1);
    }

    #[test]
    fn unchanged_resize_keeps_target() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        backend.clear_calls();

        viewports.on_resize(&mut backend, &PassThrough, &window(1), Vec2::new(400.2, 300.7));

        assert!(backend.calls().is_empty());
    }

    #[test]
    fn unchanged_resize_recreates_when_fast_path_disabled() {
        let mut backend = RecordingBackend::new();
        let config = RendererConfig {
            skip_unchanged_resize: false,
            ..RendererConfig::default()
        };
        let mut viewports = ViewportManager::new(&config);
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        backend.clear_calls();

        viewports.on_resize(&mut backend, &PassThrough, &window(1), Vec2::new(400.0, 300.0));

        assert!(backend.calls().iter().any(|c| matches!(c, Call::DestroyFrameBuffer(_))));
        assert!(backend.calls().iter().any(|c| matches!(c, Call::CreateFrameBuffer { .. })));
    }

    #[test]
    fn failed_recreate_on_resize_frees_view_id() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        backend.fail_frame_buffers = true;

        let state = viewports.on_resize(&mut backend, &PassThrough, &window(1), Vec2::new(500.0, 300.0));

        assert_eq!(state, ViewportState::Uninitialized);
        assert_eq!(viewports.state(ViewportId(1)), ViewportState::Uninitialized);
        assert!(viewports.record(ViewportId(1)).is_none());
        assert_eq!(backend.live_frame_buffers(), 0);

        backend.fail_frame_buffers = false;
        viewports.on_create(&mut backend, &PassThrough, &window(2));
        assert_eq!(viewports.record(ViewportId(2)).unwrap().view_id, ViewId(100));
    }

    #[test]
    fn resize_of_uninitialized_window_creates_it() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();

        let state = viewports.on_resize(&mut backend, &PassThrough, &window(1), Vec2::new(200.0, 100.0));

        assert_eq!(state, ViewportState::FrameBufferReady);
    }

    // ── render ────────────────────────────────────────────────────────────

    fn ready_device(backend: &mut RecordingBackend) -> DeviceObjects {
        let mut device = DeviceObjects::new();
        device.init(backend, &mut RgbaAtlas::white()).unwrap();
        device
    }

    #[test]
    fn render_clears_unless_host_opts_out() {
        let mut backend = RecordingBackend::new();
        let device = ready_device(&mut backend);
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        let data = DrawData::new(Vec2::zero(), Vec2::new(400.0, 300.0), Vec2::splat(1.0));

        backend.clear_calls();
        let vp = window(1).with_draw_data(&data);
        assert!(viewports.on_render(&mut backend, &device, &vp, "relay").is_some());
        assert!(backend.calls().iter().any(
            |c| matches!(c, Call::SetViewClear(ViewId(100), clear) if clear.rgba == 0x0000_00ff)
        ));

        backend.clear_calls();
        let vp = vp.with_flags(ViewportFlags::NO_RENDERER_CLEAR);
        viewports.on_render(&mut backend, &device, &vp, "relay");
        assert!(backend.calls().contains(&Call::Touch(ViewId(100))));
        assert!(!backend.calls().iter().any(|c| matches!(c, Call::SetViewClear(..))));
    }

    #[test]
    fn render_of_uninitialized_window_does_nothing() {
        let mut backend = RecordingBackend::new();
        let device = ready_device(&mut backend);
        let mut viewports = manager();
        let data = DrawData::new(Vec2::zero(), Vec2::new(400.0, 300.0), Vec2::splat(1.0));
        backend.clear_calls();

        let stats = viewports.on_render(&mut backend, &device, &window(1).with_draw_data(&data), "relay");

        assert_eq!(stats, None);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn destroy_all_releases_every_target() {
        let mut backend = RecordingBackend::new();
        let mut viewports = manager();
        viewports.on_create(&mut backend, &PassThrough, &window(1));
        viewports.on_create(&mut backend, &PassThrough, &window(2));

        viewports.destroy_all(&mut backend);

        assert!(viewports.is_empty());
        assert_eq!(backend.live_frame_buffers(), 0);
    }
}
