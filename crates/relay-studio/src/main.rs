//! Multi-window host for relay-render.
//!
//! `N` opens a secondary viewport window, closing it destroys its render
//! target, `Escape` or closing the main window exits.

mod config;
mod glyphs;
mod scene;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use relay_render::backend::{SurfaceErrorAction, ViewId, WgpuBackend, WgpuInit};
use relay_render::coords::Vec2;
use relay_render::device::FontAtlas;
use relay_render::logging::{init_logging, LoggingConfig};
use relay_render::viewport::{Viewport, ViewportId, ViewportState};
use relay_render::RenderContext;

use config::{StudioConfig, CONFIG_FILE};
use glyphs::GlyphAtlas;
use scene::Scene;

type SharedWindows = Rc<RefCell<HashMap<u64, Arc<Window>>>>;

fn main() -> Result<()> {
    let config = StudioConfig::load(Path::new(CONFIG_FILE))?;

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let glyphs = match &config.font {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
            GlyphAtlas::from_font(&bytes, config.font_size)?
        }
        None => {
            log::info!("no font configured; text is not drawn");
            GlyphAtlas::white()
        }
    };

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut studio = Studio::new(config, glyphs);

    event_loop
        .run_app(&mut studio)
        .context("winit event loop terminated with error")?;

    Ok(())
}

struct MainWindow {
    window: Arc<Window>,
    ctx: RenderContext<WgpuBackend>,
}

struct SecondaryWindow {
    window: Arc<Window>,
    viewport: ViewportId,
    state: ViewportState,
}

struct Studio {
    config: StudioConfig,
    glyphs: GlyphAtlas,
    scene: Scene,
    started: Instant,

    main: Option<MainWindow>,
    secondary: HashMap<WindowId, SecondaryWindow>,
    /// Read by the renderer's native handle resolver.
    native: SharedWindows,
    next_viewport: u64,

    last_frame: u64,
    exit_requested: bool,
}

impl Studio {
    fn new(config: StudioConfig, glyphs: GlyphAtlas) -> Self {
        Self {
            config,
            glyphs,
            scene: Scene::new(),
            started: Instant::now(),
            main: None,
            secondary: HashMap::new(),
            native: Rc::default(),
            next_viewport: 1,
            last_frame: 0,
            exit_requested: false,
        }
    }

    fn create_main(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attrs).context("failed to create window")?);

        let size = window.inner_size();
        let init = WgpuInit {
            max_view_id: self.config.renderer.max_view_id,
            ..WgpuInit::default()
        };
        let backend = pollster::block_on(WgpuBackend::new(window.clone(), size.width.max(1), size.height.max(1), init))
            .context("GPU initialization failed")?;

        let native = Rc::clone(&self.native);
        let resolver = move |vp: &Viewport<'_>| {
            let windows = native.borrow();
            vp.platform_handle
                .and_then(|h| windows.get(&h))
                .map(|w| wgpu::SurfaceTarget::from(Arc::clone(w)))
        };

        let mut ctx = RenderContext::new(backend, ViewId(0), resolver, self.config.renderer.clone());
        let info = ctx.backend_info();
        log::info!("{} ready, capabilities {:?}", info.renderer_name, info.capabilities);

        if !ctx.new_frame(self.glyphs.atlas_mut()) {
            anyhow::bail!("renderer device objects failed to initialize");
        }

        self.main = Some(MainWindow { window, ctx });
        Ok(())
    }

    fn open_viewport(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(main) = self.main.as_mut() else { return Ok(()) };

        let id = ViewportId(self.next_viewport);
        self.next_viewport += 1;

        let attrs = Window::default_attributes()
            .with_title(format!("{} / {id}", self.config.title))
            .with_inner_size(LogicalSize::new(360.0, 240.0));
        let window = Arc::new(event_loop.create_window(attrs).context("failed to create viewport window")?);

        let handle = u64::from(window.id());
        self.native.borrow_mut().insert(handle, Arc::clone(&window));

        let state = main.ctx.on_create_window(&describe(&window, id));
        log::info!("{id} opened: {state:?}");

        self.secondary.insert(window.id(), SecondaryWindow { window, viewport: id, state });
        Ok(())
    }

    fn close_viewport(&mut self, window_id: WindowId) {
        let Some(entry) = self.secondary.remove(&window_id) else { return };
        if let Some(main) = self.main.as_mut() {
            let state = main.ctx.on_destroy_window(entry.viewport);
            log::info!("{} closed: {state:?}", entry.viewport);
        }
        self.native.borrow_mut().remove(&u64::from(window_id));
    }

    fn resize_viewport(&mut self, window_id: WindowId) {
        let (Some(main), Some(entry)) = (self.main.as_mut(), self.secondary.get_mut(&window_id)) else {
            return;
        };
        let viewport = describe(&entry.window, entry.viewport);
        entry.state = main.ctx.on_set_window_size(&viewport, viewport.size);
    }

    fn redraw(&mut self) {
        let Some(main) = self.main.as_mut() else { return };

        if !main.ctx.new_frame(self.glyphs.atlas_mut()) {
            return;
        }
        let font = self.glyphs.atlas().texture_id().unwrap_or_default();
        let t = self.started.elapsed().as_secs_f32();

        let scale = main.window.scale_factor() as f32;
        let logical = main.window.inner_size().to_logical::<f32>(f64::from(scale));
        let status = format!(
            "frame {}  viewports {}  callbacks {}",
            self.last_frame,
            main.ctx.viewports().len(),
            self.scene.callback_hits()
        );
        let data = self.scene.main(&self.glyphs, font, Vec2::new(logical.width, logical.height), scale, t, &status);
        let stats = main.ctx.render_main(&data, Some(0x1e22_2aff));
        if stats.lists_dropped > 0 {
            log::warn!("main view dropped {} lists", stats.lists_dropped);
        }

        for entry in self.secondary.values() {
            if entry.state != ViewportState::FrameBufferReady {
                continue;
            }
            let viewport = describe(&entry.window, entry.viewport);
            let pos = entry
                .window
                .inner_position()
                .map(|p| p.to_logical::<f32>(f64::from(viewport.dpi_scale)))
                .map_or(Vec2::zero(), |p| Vec2::new(p.x, p.y));
            let label = entry.viewport.to_string();
            let vp_data = self.scene.viewport(&self.glyphs, font, pos, viewport.size, viewport.dpi_scale, &label);
            main.ctx.on_render_window(&viewport.with_draw_data(&vp_data));
        }

        self.last_frame = main.ctx.frame();

        match main.ctx.backend_mut().take_surface_action() {
            Some(SurfaceErrorAction::Fatal) => {
                log::error!("main surface lost beyond recovery; exiting");
                self.exit_requested = true;
            }
            Some(action) => log::debug!("main surface: {action:?}"),
            None => {}
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut main) = self.main.take() {
            main.ctx.shutdown(self.glyphs.atlas_mut());
        }
        self.secondary.clear();
        self.native.borrow_mut().clear();
    }
}

/// Snapshot of `window` for the renderer's viewport callbacks.
fn describe<'a>(window: &Window, id: ViewportId) -> Viewport<'a> {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<f32>(scale);
    Viewport::new(
        id,
        Some(u64::from(window.id())),
        Vec2::new(logical.width, logical.height),
        scale as f32,
    )
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.main.is_some() {
            return;
        }
        if let Err(e) = self.create_main(event_loop) {
            log::error!("failed to create main window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            self.shutdown();
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(main) = &self.main {
            main.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let is_main = self.main.as_ref().is_some_and(|m| m.window.id() == window_id);

        match event {
            WindowEvent::CloseRequested if is_main => self.exit_requested = true,
            WindowEvent::CloseRequested => self.close_viewport(window_id),

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed && !event.repeat => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => self.exit_requested = true,
                    PhysicalKey::Code(KeyCode::KeyN) => {
                        if let Err(e) = self.open_viewport(event_loop) {
                            log::error!("failed to open viewport: {e:#}");
                        }
                    }
                    _ => {}
                }
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } if is_main => {
                if let Some(main) = self.main.as_mut() {
                    let size = main.window.inner_size();
                    main.ctx.backend_mut().resize(size.width, size.height);
                    main.window.request_redraw();
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize_viewport(window_id),

            WindowEvent::RedrawRequested if is_main => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            self.shutdown();
            event_loop.exit();
        }
    }
}
